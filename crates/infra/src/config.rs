//! Layered application configuration.
//!
//! Sources, later ones win: built-in defaults, `config/default.toml`,
//! `config/{RUN_MODE}.toml`, then `STOCKROOM__*` environment variables
//! (`STOCKROOM__SERVER__PORT=9000`).

use std::env;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use stockroom_observability::LogFormat;

const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "STOCKROOM";
const DEFAULT_RUN_MODE: &str = "development";
const DEV_JWT_SECRET: &str = "stockroom-development-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Without a `url` the service runs on the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForecastConfig {
    /// Trailing window of movement history fed to the demand predictor.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            default_horizon_days: default_horizon_days(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_history_days() -> u32 {
    90
}

fn default_horizon_days() -> u32 {
    30
}

impl AppConfig {
    /// Load from files and environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_RUN_MODE.to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
            .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_mode}")).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;

        if app.auth.jwt_secret.is_none() {
            if run_mode == DEFAULT_RUN_MODE {
                tracing::warn!(
                    "auth.jwt_secret not set; using the development default (set STOCKROOM__AUTH__JWT_SECRET)"
                );
                app.auth.jwt_secret = Some(DEV_JWT_SECRET.to_string());
            } else {
                return Err(ConfigError::Invalid(format!(
                    "auth.jwt_secret is required in {run_mode} mode"
                )));
            }
        }

        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into())),
        }
        if self.forecast.history_days == 0 {
            return Err(ConfigError::Invalid("forecast.history_days must be at least 1".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }

    /// Secret bytes for HS256 verification. Only meaningful after [`AppConfig::validate`].
    pub fn jwt_secret(&self) -> &[u8] {
        self.auth.jwt_secret.as_deref().unwrap_or_default().as_bytes()
    }
}
