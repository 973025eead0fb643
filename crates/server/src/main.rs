//! Cloud Config Server - bootstrap entry point
//!
//! Loads the layered server environment (command line, environment
//! variables, `application[-<profile>].{toml,yml,yaml,json}`), dumps it at
//! debug level once initialization finishes, and binds the settings the
//! config server starts with.
//!
//! Commands:
//! - `check`: load, dump at debug level, bind and validate the settings
//! - `dump`: print the environment report to stdout

mod settings;
mod validation;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cloud_config_env::{dump_env, report, Environment, EnvironmentLoader, TracingSink};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::BootstrapSettings;
use crate::validation::validate_settings;

/// Cloud Config Server CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing application config files
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Base name of the config files
    #[arg(long, default_value = "application")]
    config_name: String,

    /// Comma separated profiles, overrides spring.profiles.active
    #[arg(long, value_delimiter = ',')]
    profiles: Vec<String>,

    /// Prefix of environment variables mapped to properties
    #[arg(long, default_value = "CONFIG_SERVER")]
    env_prefix: String,

    /// Property override as KEY=VALUE, may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Load and validate the bootstrap configuration
    Check,
    /// Print the resolved environment report
    Dump,
}

impl Args {
    /// Overrides in `--key=value` form for the command line source
    fn command_line(&self) -> Vec<String> {
        self.properties.iter().map(|kv| format!("--{kv}")).collect()
    }

    fn load_environment(&self) -> anyhow::Result<Environment> {
        let mut builder = EnvironmentLoader::builder()
            .config_dir(&self.config_dir)
            .config_name(&self.config_name)
            .env_prefix(&self.env_prefix)
            .command_line(self.command_line());

        if !self.profiles.is_empty() {
            builder = builder.profiles(self.profiles.iter().cloned());
        }

        builder.build().with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_dir.display()
            )
        })
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloud_config_server=info,cloud_config_env=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let env = args.load_environment()?;

    match args.command {
        Command::Check => check(&env),
        Command::Dump => {
            print!("{}", report(&env));
            Ok(())
        }
    }
}

/// Startup sequence: environment is initialized, dump it, then bind settings
fn check(env: &Environment) -> anyhow::Result<()> {
    info!("Starting Cloud Config Server bootstrap");
    info!("  Active profiles: {:?}", env.active_profiles());

    dump_env(env, &TracingSink);

    let settings =
        BootstrapSettings::from_environment(env).context("Failed to bind bootstrap settings")?;
    validate_settings(&settings).context("Invalid bootstrap settings")?;

    info!("  Application: {}", settings.application_name);
    info!(
        "  Listen: {}:{}{}",
        settings.server.address, settings.server.port, settings.config_server.prefix
    );
    info!("  Backend: {}", settings.backend_name());
    if let Some(git) = &settings.config_server.git {
        info!("  Git: {} (label {})", git.uri, git.default_label);
    }
    if let Some(native) = &settings.config_server.native {
        info!("  Native: {}", native.search_locations.join(", "));
    }
    info!("Bootstrap configuration is valid");

    Ok(())
}
