//! Environment variable property source

use crate::{ConfigError, PropertySource, PropertyValue, Result};
use config::{Environment, Source, ValueKind};
use std::collections::{BTreeMap, HashMap};

/// Properties taken from prefixed process environment variables
///
/// Variables are mapped with the `config` crate's environment source: with
/// prefix `APP` and separator `__`, `APP__SERVER__PORT=9090` becomes
/// `server.port = "9090"`.
#[derive(Debug, Clone)]
pub struct SystemEnvironmentPropertySource {
    prefix: String,
    properties: BTreeMap<String, PropertyValue>,
}

impl SystemEnvironmentPropertySource {
    pub const NAME: &'static str = "systemEnvironment";
    pub const SEPARATOR: &'static str = "__";

    /// Collect variables with the given prefix from the process environment
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::collect(prefix, Environment::with_prefix(prefix))
    }

    /// Collect variables with the given prefix from an explicit map
    pub fn from_map(prefix: &str, vars: HashMap<String, String>) -> Result<Self> {
        Self::collect(prefix, Environment::with_prefix(prefix).source(Some(vars)))
    }

    fn collect(prefix: &str, environment: Environment) -> Result<Self> {
        let collected = environment
            .separator(Self::SEPARATOR)
            .collect()
            .map_err(ConfigError::from)?;

        let properties = collected
            .into_iter()
            .map(|(key, value)| {
                let value = match value.kind {
                    ValueKind::Nil => PropertyValue::Null,
                    ValueKind::Boolean(b) => PropertyValue::Boolean(b),
                    ValueKind::I64(i) => PropertyValue::Integer(i),
                    ValueKind::Float(f) => PropertyValue::Float(f),
                    ValueKind::String(s) => PropertyValue::Text(s),
                    other => PropertyValue::Text(other.to_string()),
                };
                (key, value)
            })
            .collect();

        Ok(Self {
            prefix: prefix.to_string(),
            properties,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl PropertySource for SystemEnvironmentPropertySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> &'static str {
        "SystemEnvironmentPropertySource"
    }

    fn get(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key).cloned()
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.properties.keys().cloned().collect())
    }
}
