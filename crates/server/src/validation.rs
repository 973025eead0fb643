//! Bootstrap settings validation

use crate::settings::{BootstrapSettings, GitBackend};
use cloud_config_env::{ConfigError, Result};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the bootstrap settings, reporting every problem at once
pub fn validate_settings(settings: &BootstrapSettings) -> Result<()> {
    let mut errors = Vec::new();

    if settings.application_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "spring.application.name",
            "application name is required",
        ));
    }

    if settings.server.port == 0 {
        errors.push(ValidationError::new(
            "server.port",
            "port must be greater than 0",
        ));
    }

    let prefix = &settings.config_server.prefix;
    if !prefix.is_empty() && !prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "spring.cloud.config.server.prefix",
            format!("prefix '{prefix}' must start with '/'"),
        ));
    }

    let config_server = &settings.config_server;
    if config_server.git.is_none() && config_server.native.is_none() {
        errors.push(ValidationError::new(
            "spring.cloud.config.server",
            "no backend configured, set git.uri or activate the native profile",
        ));
    }

    if let Some(git) = &config_server.git {
        if let Err(e) = validate_git_backend(git) {
            errors.push(ValidationError::new("spring.cloud.config.server.git.uri", e));
        }
    }

    if let Some(native) = &config_server.native {
        if native.search_locations.is_empty() {
            errors.push(ValidationError::new(
                "spring.cloud.config.server.native.search-locations",
                "at least one search location is required",
            ));
        }

        for (idx, location) in native.search_locations.iter().enumerate() {
            if location.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("spring.cloud.config.server.native.search-locations[{idx}]"),
                    "search location cannot be empty",
                ));
            }
        }
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate a git backend URI
pub fn validate_git_backend(git: &GitBackend) -> std::result::Result<(), String> {
    let uri = git.uri.trim();
    if uri.is_empty() {
        return Err("URI cannot be empty".to_string());
    }

    if !uri.starts_with("http://")
        && !uri.starts_with("https://")
        && !uri.starts_with("ssh://")
        && !uri.starts_with("git@")
        && !uri.starts_with("file:")
    {
        return Err("URI must start with http://, https://, ssh://, git@, or file:".to_string());
    }

    Ok(())
}
