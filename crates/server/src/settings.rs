//! Bootstrap settings bound from the environment

use cloud_config_env::{Environment, Result};
use serde::{Deserialize, Serialize};

/// Property holding the application name
pub const APPLICATION_NAME_PROPERTY: &str = "spring.application.name";

/// Everything the config server needs to start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSettings {
    /// Application name (`spring.application.name`)
    pub application_name: String,

    /// Listener configuration (`server.*`)
    pub server: ServerProperties,

    /// Backend configuration (`spring.cloud.config.server.*`)
    pub config_server: ConfigServerProperties,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerProperties {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen address
    #[serde(default = "default_address")]
    pub address: String,
}

/// Config server backends and routing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigServerProperties {
    /// Path prefix for all config endpoints
    #[serde(default)]
    pub prefix: String,

    /// Git backed repository
    #[serde(default)]
    pub git: Option<GitBackend>,

    /// File system backed repository
    #[serde(default)]
    pub native: Option<NativeBackend>,
}

/// Git repository backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitBackend {
    /// Repository URI
    pub uri: String,

    /// Branch, tag or commit used when a request names no label
    #[serde(default = "default_label")]
    pub default_label: String,

    /// Directories searched inside the repository
    #[serde(default)]
    pub search_paths: Vec<String>,

    /// Clone eagerly at startup
    #[serde(default)]
    pub clone_on_start: bool,
}

/// File system backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NativeBackend {
    /// Locations searched for config files
    #[serde(default)]
    pub search_locations: Vec<String>,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
        }
    }
}

impl BootstrapSettings {
    /// Bind settings from a built environment
    ///
    /// The native backend only counts as configured when the `native`
    /// profile is active.
    pub fn from_environment(env: &Environment) -> Result<Self> {
        let application_name = env
            .resolve_text(APPLICATION_NAME_PROPERTY)?
            .unwrap_or_else(default_application_name);

        let server: ServerProperties = env.bind("server")?;
        let mut config_server: ConfigServerProperties = env.bind("spring.cloud.config.server")?;

        if !env.active_profiles().iter().any(|p| p == "native") {
            config_server.native = None;
        }

        Ok(Self {
            application_name,
            server,
            config_server,
        })
    }

    /// Name of the backend requests will be served from
    pub fn backend_name(&self) -> &'static str {
        match (&self.config_server.native, &self.config_server.git) {
            (Some(_), _) => "native",
            (None, Some(_)) => "git",
            (None, None) => "none",
        }
    }
}

fn default_application_name() -> String {
    "application".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_label() -> String {
    "main".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_config_env::{EnvironmentLoader, PropertyValue};

    fn load(profiles: &[&str], args: &[&str]) -> Environment {
        let mut builder = EnvironmentLoader::builder()
            .config_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config"))
            .command_line(args.iter().copied())
            .random_values(false);
        if !profiles.is_empty() {
            builder = builder.profiles(profiles.iter().copied());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let env = Environment::default();
        let settings = BootstrapSettings::from_environment(&env).unwrap();

        assert_eq!(settings.application_name, "application");
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.server.address, "0.0.0.0");
        assert!(settings.config_server.git.is_none());
        assert_eq!(settings.backend_name(), "none");
    }

    #[test]
    fn test_bind_sample_config() {
        let settings = BootstrapSettings::from_environment(&load(&[], &[])).unwrap();

        assert_eq!(settings.application_name, "configserver");
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.config_server.prefix, "/config");
        assert_eq!(settings.backend_name(), "native");

        let native = settings.config_server.native.unwrap();
        assert_eq!(native.search_locations.len(), 2);
    }

    #[test]
    fn test_git_backend_without_native_profile() {
        let settings = BootstrapSettings::from_environment(&load(&["prod"], &[])).unwrap();

        assert_eq!(settings.backend_name(), "git");
        assert_eq!(settings.server.port, 443);
        let git = settings.config_server.git.unwrap();
        assert_eq!(git.uri, "https://github.com/yidigun/config-repo-prod");
        assert_eq!(git.default_label, "main");
        assert!(git.clone_on_start);
    }

    #[test]
    fn test_command_line_overrides_port() {
        let env = load(&[], &["--server.port=9999"]);
        assert_eq!(
            env.resolve_text("server.port").unwrap().as_deref(),
            Some("9999")
        );

        let settings = BootstrapSettings::from_environment(&env).unwrap();
        assert_eq!(settings.server.port, 9999);
    }

    #[test]
    fn test_empty_search_paths_bind() {
        let mut env = Environment::default();
        env.push_last(
            cloud_config_env::MapPropertySource::new("file", Default::default())
                .with_property(
                    "spring.cloud.config.server.git.uri",
                    PropertyValue::from("https://example.com/repo"),
                )
                .with_property(
                    "spring.cloud.config.server.git.search-paths",
                    PropertyValue::empty_list(),
                ),
        );

        let settings = BootstrapSettings::from_environment(&env).unwrap();
        let git = settings.config_server.git.unwrap();
        assert!(git.search_paths.is_empty());
    }

    #[test]
    fn test_invalid_port_fails_to_bind() {
        let mut env = Environment::default();
        env.push_last(
            cloud_config_env::MapPropertySource::new("cli", Default::default())
                .with_property("server.port", PropertyValue::from("not-a-port")),
        );
        assert!(BootstrapSettings::from_environment(&env).is_err());
    }
}
