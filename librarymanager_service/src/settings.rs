use anyhow::Context;
use serde::Deserialize;

use crate::password_encoder::PasswordEncoderSettings;
use crate::postgres::PostgresConfig;

const CONFIG_FILE_ENV: &str = "LIBRARYMANAGER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "librarymanager.toml";
const ENV_PREFIX: &str = "LIBRARYMANAGER";

/// Service configuration, every field has a default so an empty
/// environment yields a runnable in-process setup against local postgres
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub password_encoder: PasswordEncoderSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads the optional TOML file, then overlays `LIBRARYMANAGER__*` variables,
    /// e.g. `LIBRARYMANAGER__DATABASE__HOSTNAME`
    pub fn load() -> anyhow::Result<Self> {
        let config_file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(&config_file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub use_in_memory_db: bool,
    #[serde(default = "DatabaseSettings::default_hostname")]
    pub hostname: String,
    #[serde(default = "DatabaseSettings::default_credential")]
    pub username: String,
    #[serde(default = "DatabaseSettings::default_credential")]
    pub password: String,
}

impl DatabaseSettings {
    fn default_hostname() -> String {
        "127.0.0.1".to_string()
    }

    fn default_credential() -> String {
        "postgres".to_string()
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            hostname: self.hostname.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            use_in_memory_db: false,
            hostname: Self::default_hostname(),
            username: Self::default_credential(),
            password: Self::default_credential(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "TelemetrySettings::default_service_name")]
    pub service_name: String,
}

impl TelemetrySettings {
    fn default_service_name() -> String {
        "librarymanager_service".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: Self::default_service_name(),
        }
    }
}
