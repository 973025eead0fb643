//! Property sources and profile activation

use crate::PropertyValue;
use std::collections::BTreeMap;

/// Reserved key that restricts a source to a set of profiles
pub const ACTIVATE_ON_PROFILE: &str = "spring.config.activate.on-profile";

/// A named origin of configuration key-value pairs
pub trait PropertySource: Send + Sync {
    /// Name shown in reports, e.g. `commandLineArgs`
    fn name(&self) -> &str;

    /// Kind label of the concrete source
    fn kind(&self) -> &'static str;

    /// Raw lookup in this source only, without placeholder resolution
    fn get(&self, key: &str) -> Option<PropertyValue>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All keys held by this source, or `None` when the source cannot list them
    fn property_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Check a source's activation key against the active profiles
///
/// The activation value is a comma separated list; the source is active
/// when any entry matches. An entry `!name` matches when `name` is not active.
/// Sources without the key are always active.
pub fn is_source_active(source: &dyn PropertySource, active_profiles: &[String]) -> bool {
    let Some(value) = source.get(ACTIVATE_ON_PROFILE) else {
        return true;
    };
    if value.is_null() {
        return true;
    }

    let expression = value.to_string();
    expression
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .any(|entry| match entry.strip_prefix('!') {
            Some(negated) => !active_profiles.iter().any(|p| p == negated.trim()),
            None => active_profiles.iter().any(|p| p == entry),
        })
}

/// Enumerable source backed by an in-memory map
#[derive(Debug, Clone)]
pub struct MapPropertySource {
    name: String,
    kind: &'static str,
    properties: BTreeMap<String, PropertyValue>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, PropertyValue>) -> Self {
        Self {
            name: name.into(),
            kind: "MapPropertySource",
            properties,
        }
    }

    /// Source holding one document of a config file
    pub fn from_document(
        name: impl Into<String>,
        properties: BTreeMap<String, PropertyValue>,
    ) -> Self {
        Self {
            kind: "OriginTrackedMapPropertySource",
            ..Self::new(name, properties)
        }
    }

    /// Insert or replace a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn get(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.properties.keys().cloned().collect())
    }
}

/// Properties passed as `--key=value` arguments
#[derive(Debug, Clone)]
pub struct CommandLinePropertySource {
    properties: BTreeMap<String, PropertyValue>,
    non_option_args: Vec<String>,
}

impl CommandLinePropertySource {
    pub const NAME: &'static str = "commandLineArgs";

    /// Parse arguments of the form `--key=value` or `--flag`
    ///
    /// A bare `--flag` is stored as an empty string. Arguments that do not
    /// start with `--` are kept as non-option arguments and never become
    /// properties.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut properties = BTreeMap::new();
        let mut non_option_args = Vec::new();

        for arg in args {
            let arg = arg.as_ref();
            match arg.strip_prefix("--") {
                Some(option) if !option.is_empty() => {
                    let (key, value) = option.split_once('=').unwrap_or((option, ""));
                    if key.is_empty() {
                        non_option_args.push(arg.to_string());
                    } else {
                        properties.insert(key.to_string(), PropertyValue::from(value));
                    }
                }
                _ => non_option_args.push(arg.to_string()),
            }
        }

        Self {
            properties,
            non_option_args,
        }
    }

    pub fn non_option_args(&self) -> &[String] {
        &self.non_option_args
    }
}

impl PropertySource for CommandLinePropertySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> &'static str {
        "SimpleCommandLinePropertySource"
    }

    fn get(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key).cloned()
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.properties.keys().cloned().collect())
    }
}
