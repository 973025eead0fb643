//! Building an environment from files, environment variables and arguments

use crate::document::{parse_documents, FileFormat};
use crate::{
    is_source_active, CommandLinePropertySource, ConfigError, Environment, MapPropertySource,
    PropertySource, PropertyValue, RandomValuePropertySource, Result,
    SystemEnvironmentPropertySource,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Property naming the profiles to activate when none are given explicitly
pub const ACTIVE_PROFILES_PROPERTY: &str = "spring.profiles.active";

/// Loads config files into property sources
pub struct EnvironmentLoader;

impl EnvironmentLoader {
    /// Load every document of a config file as its own source
    ///
    /// The format is chosen by file extension (TOML, YAML or JSON). Sources
    /// are returned in file order.
    pub fn from_file(path: &Path) -> Result<Vec<MapPropertySource>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(extension).ok_or_else(|| {
            ConfigError::LoadError(format!("Unsupported file extension: {}", extension))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::from_str(&path.display().to_string(), &content, format)
    }

    /// Parse config content into sources named after `origin`
    pub fn from_str(origin: &str, content: &str, format: FileFormat) -> Result<Vec<MapPropertySource>> {
        let documents = parse_documents(content, format)?;
        let multiple = documents.len() > 1;

        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(idx, document)| {
                let name = if multiple {
                    format!("Config resource 'file [{}]' (document #{})", origin, idx + 1)
                } else {
                    format!("Config resource 'file [{}]'", origin)
                };
                MapPropertySource::from_document(name, document)
            })
            .collect())
    }

    /// Start building an environment
    pub fn builder() -> EnvironmentLoaderBuilder {
        EnvironmentLoaderBuilder::default()
    }
}

/// Builder assembling the full source stack of an environment
///
/// Sources are ordered, highest priority first: command line arguments,
/// environment variables, random values, additional files, profile specific
/// files (`<name>-<profile>.<ext>`, last profile wins), base files
/// (`<name>.<ext>`) and finally default properties.
#[derive(Debug, Clone)]
pub struct EnvironmentLoaderBuilder {
    config_dir: PathBuf,
    config_name: String,
    profiles: Vec<String>,
    env_prefix: Option<String>,
    env_vars: Option<HashMap<String, String>>,
    command_line: Vec<String>,
    additional_files: Vec<(PathBuf, bool)>,
    defaults: BTreeMap<String, PropertyValue>,
    random_values: bool,
}

impl Default for EnvironmentLoaderBuilder {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            config_name: "application".to_string(),
            profiles: Vec::new(),
            env_prefix: None,
            env_vars: None,
            command_line: Vec::new(),
            additional_files: Vec::new(),
            defaults: BTreeMap::new(),
            random_values: true,
        }
    }
}

impl EnvironmentLoaderBuilder {
    /// Directory searched for config files
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Base name of config files, `application` by default
    pub fn config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = name.into();
        self
    }

    /// Activate these profiles instead of reading `spring.profiles.active`
    pub fn profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    /// Add environment variables with this prefix as a source
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Read environment variables from this map instead of the process
    pub fn env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Arguments of the form `--key=value`
    pub fn command_line<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_line = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add a configuration file source
    pub fn add_file(mut self, path: impl Into<PathBuf>, required: bool) -> Self {
        self.additional_files.push((path.into(), required));
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Whether to include the `random.*` source
    pub fn random_values(mut self, enabled: bool) -> Self {
        self.random_values = enabled;
        self
    }

    /// Build the environment
    pub fn build(self) -> Result<Environment> {
        let command_line = CommandLinePropertySource::parse(&self.command_line);

        let system = match &self.env_prefix {
            Some(prefix) => Some(match &self.env_vars {
                Some(vars) => SystemEnvironmentPropertySource::from_map(prefix, vars.clone())?,
                None => SystemEnvironmentPropertySource::from_env(prefix)?,
            }),
            None => None,
        };

        let base = self.load_named(&self.config_name)?;

        let profiles = if self.profiles.is_empty() {
            let mut candidates: Vec<&dyn PropertySource> = Vec::new();
            candidates.push(&command_line);
            if let Some(system) = &system {
                candidates.push(system);
            }
            candidates.extend(base.iter().map(|s| s as &dyn PropertySource));
            detect_profiles(&candidates)
        } else {
            self.profiles.clone()
        };
        debug!("Active profiles: {:?}", profiles);

        let mut sources: Vec<Box<dyn PropertySource>> = Vec::new();
        if !self.command_line.is_empty() {
            sources.push(Box::new(command_line));
        }
        if let Some(system) = system {
            sources.push(Box::new(system));
        }
        if self.random_values {
            sources.push(Box::new(RandomValuePropertySource));
        }

        for (path, required) in self.additional_files.iter().rev() {
            if !path.is_file() {
                if *required {
                    return Err(ConfigError::LoadError(format!(
                        "Required config file not found: {}",
                        path.display()
                    )));
                }
                debug!("Skipping missing optional config file: {}", path.display());
                continue;
            }
            push_documents(&mut sources, EnvironmentLoader::from_file(path)?);
        }

        for profile in profiles.iter().rev() {
            let name = format!("{}-{}", self.config_name, profile);
            for source in self.load_named(&name)? {
                sources.push(Box::new(source));
            }
        }

        for source in base {
            sources.push(Box::new(source));
        }

        if !self.defaults.is_empty() {
            sources.push(Box::new(MapPropertySource::new(
                "defaultProperties",
                self.defaults,
            )));
        }

        debug!("Environment built with {} property sources", sources.len());
        Ok(Environment::new(sources, profiles))
    }

    /// Load `<name>.<ext>` for every supported extension, highest priority first
    fn load_named(&self, name: &str) -> Result<Vec<MapPropertySource>> {
        let mut sources = Vec::new();

        for extension in FileFormat::EXTENSIONS {
            let path = self.config_dir.join(format!("{name}.{extension}"));
            if !path.is_file() {
                continue;
            }
            let documents = EnvironmentLoader::from_file(&path)?;
            debug!(
                "Loaded {} document(s) from {}",
                documents.len(),
                path.display()
            );
            sources.extend(documents.into_iter().rev());
        }

        if sources.is_empty() {
            debug!(
                "No config files named '{}' in {}",
                name,
                self.config_dir.display()
            );
        }
        Ok(sources)
    }
}

/// Later documents of a file override earlier ones
fn push_documents(sources: &mut Vec<Box<dyn PropertySource>>, documents: Vec<MapPropertySource>) {
    for document in documents.into_iter().rev() {
        sources.push(Box::new(document));
    }
}

/// First `spring.profiles.active` value among ungated sources
fn detect_profiles(candidates: &[&dyn PropertySource]) -> Vec<String> {
    candidates
        .iter()
        .filter(|s| is_source_active(**s, &[]))
        .find_map(|s| declared_profiles(*s))
        .unwrap_or_default()
}

/// Profiles a source declares, as a comma list or as an indexed list
fn declared_profiles(source: &dyn PropertySource) -> Option<Vec<String>> {
    match source.get(ACTIVE_PROFILES_PROPERTY) {
        Some(value) if value.is_empty_collection() => Some(Vec::new()),
        Some(value) if !value.is_null() => Some(split_profiles(&value.to_string()).collect()),
        _ => {
            let items: Vec<String> = (0..)
                .map_while(|idx| source.get(&format!("{ACTIVE_PROFILES_PROPERTY}[{idx}]")))
                .filter(|v| !v.is_null())
                .flat_map(|v| split_profiles(&v.to_string()).collect::<Vec<_>>())
                .collect();
            (!items.is_empty()).then_some(items)
        }
    }
}

fn split_profiles(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
