//! Layered configuration environment for the Cloud Config server
//!
//! This crate provides the property environment the server bootstraps from:
//! - Ordered property sources (command line, environment variables, random
//!   values, config file documents, defaults)
//! - Profile-gated sources via `spring.config.activate.on-profile`
//! - `${key:default}` placeholder resolution across all sources
//! - Weakly typed binding of property subtrees into settings structs
//! - A diff-style dump of raw vs. resolved values for debugging

mod document;
mod environment;
mod loader;
mod placeholder;
mod random;
mod report;
mod source;
mod system;
mod value;

pub use document::FileFormat;
pub use environment::*;
pub use loader::*;
pub use placeholder::ResolveError;
pub use random::*;
pub use report::*;
pub use source::*;
pub use system::*;
pub use value::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config library error: {0}")]
    ConfigLibError(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Property resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
