//! Ordered property sources with profile-aware resolution

use crate::placeholder::PlaceholderResolver;
use crate::{is_source_active, ConfigError, PropertySource, PropertyValue, ResolveError, Result};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::warn;

/// Read access to resolved properties
pub trait PropertyResolver {
    /// Final value for `key` after overrides and placeholder substitution
    fn resolve(&self, key: &str) -> std::result::Result<Option<PropertyValue>, ResolveError>;

    /// Concrete type name, shown when the resolver cannot be inspected
    fn type_name(&self) -> &str;

    /// Access to the underlying sources and profiles, if this resolver has them
    fn as_configurable(&self) -> Option<&Environment> {
        None
    }
}

/// Layered configuration environment
///
/// Sources are ordered from highest to lowest priority. A source gated on
/// profiles that are not active takes no part in resolution.
#[derive(Default)]
pub struct Environment {
    sources: Vec<Box<dyn PropertySource>>,
    active_profiles: Vec<String>,
}

impl Environment {
    pub fn new(sources: Vec<Box<dyn PropertySource>>, active_profiles: Vec<String>) -> Self {
        Self {
            sources,
            active_profiles,
        }
    }

    /// Add a source with the highest priority
    pub fn push_first(&mut self, source: impl PropertySource + 'static) {
        self.sources.insert(0, Box::new(source));
    }

    /// Add a source with the lowest priority
    pub fn push_last(&mut self, source: impl PropertySource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    pub fn set_active_profiles(&mut self, profiles: Vec<String>) {
        self.active_profiles = profiles;
    }

    /// All sources in priority order, including inactive ones
    pub fn property_sources(&self) -> impl Iterator<Item = &dyn PropertySource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn is_active(&self, source: &dyn PropertySource) -> bool {
        is_source_active(source, &self.active_profiles)
    }

    fn active_sources(&self) -> impl Iterator<Item = &dyn PropertySource> {
        self.property_sources().filter(|s| self.is_active(*s))
    }

    /// First non-null raw value for `key` among the active sources
    pub fn raw(&self, key: &str) -> Option<PropertyValue> {
        self.active_sources()
            .filter_map(|s| s.get(key))
            .find(|v| !v.is_null())
    }

    /// Resolve `key` and render the result as text
    pub fn resolve_text(&self, key: &str) -> std::result::Result<Option<String>, ResolveError> {
        Ok(self.resolve(key)?.map(|v| v.to_string()))
    }

    /// Substitute placeholders in an arbitrary string
    pub fn resolve_placeholders(&self, text: &str) -> std::result::Result<String, ResolveError> {
        PlaceholderResolver::new(|key: &str| self.raw(key)).resolve(text)
    }

    /// Keys of all active enumerable sources, without duplicates
    pub fn property_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.active_sources()
            .filter_map(|s| s.property_names())
            .flatten()
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// Deserialize every property under `prefix` into `T`
    ///
    /// Values are converted weakly, so `server.port = "9090"` binds to a
    /// numeric field. An empty prefix binds the whole environment. Keys are
    /// bound in kebab-case (`cloneOnStart` becomes `clone-on-start`), so
    /// target structs should use `#[serde(rename_all = "kebab-case")]`.
    /// An empty list or map binds as an empty collection unless another
    /// source supplies its elements.
    pub fn bind<T: DeserializeOwned>(&self, prefix: &str) -> Result<T> {
        let mut builder = config::Config::builder();
        let names = self.property_names();

        for key in &names {
            let relative = if prefix.is_empty() {
                key.as_str()
            } else {
                match key
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };

            if let Some(value) = self.resolve(key)? {
                let superseded = value.is_empty_collection() && has_children(&names, key);
                if value.is_null() || superseded {
                    continue;
                }
                builder = builder.set_override(kebab_case(relative), value.into_value_kind())?;
            }
        }

        builder
            .build()?
            .try_deserialize()
            .map_err(ConfigError::from)
    }

    /// Freeze all resolvable properties into a snapshot
    ///
    /// Keys that fail to resolve are left out.
    pub fn snapshot(&self) -> PropertySnapshot {
        let mut properties = BTreeMap::new();
        for key in self.property_names() {
            match self.resolve(&key) {
                Ok(Some(value)) => {
                    properties.insert(key, value);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Dropping unresolvable property from snapshot"),
            }
        }
        PropertySnapshot { properties }
    }
}

/// Whether any key is an element or member of `key`
fn has_children(names: &[String], key: &str) -> bool {
    names.iter().any(|name| {
        name.strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
    })
}

/// Dashed form of a property path, leaving `[n]` subscripts alone
fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if !matches!(out.chars().last(), None | Some('-' | '.' | '[')) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl PropertyResolver for Environment {
    fn resolve(&self, key: &str) -> std::result::Result<Option<PropertyValue>, ResolveError> {
        match self.raw(key) {
            Some(PropertyValue::Text(text)) => {
                let resolved = self.resolve_placeholders(&text)?;
                Ok(Some(PropertyValue::Text(resolved)))
            }
            other => Ok(other),
        }
    }

    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_configurable(&self) -> Option<&Environment> {
        Some(self)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field(
                "sources",
                &self.property_sources().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("active_profiles", &self.active_profiles)
            .finish()
    }
}

/// Frozen resolved properties, detached from their sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySnapshot {
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertySnapshot {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter()
    }
}

impl PropertyResolver for PropertySnapshot {
    fn resolve(&self, key: &str) -> std::result::Result<Option<PropertyValue>, ResolveError> {
        Ok(self.properties.get(key).cloned())
    }

    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
