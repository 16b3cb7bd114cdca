use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_MIN_SHELF_LIFE_DAYS: i64 = 90;
const DEFAULT_TRACE_WINDOW_DAYS: i64 = 20;
const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 10;

/// Inventory policy knobs used by the lot, trace and report services.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    /// Minimum days between today and a newly received lot's expiration.
    #[serde(default = "default_min_shelf_life_days")]
    #[validate(range(min = 0))]
    pub min_shelf_life_days: i64,

    /// Default recall-search window when the caller does not supply one.
    #[serde(default = "default_trace_window_days")]
    #[validate(range(min = 1))]
    pub trace_window_days: i64,

    /// Default threshold for the almost-expired report.
    #[serde(default = "default_expiry_warning_days")]
    #[validate(range(min = 1))]
    pub expiry_warning_days: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            min_shelf_life_days: DEFAULT_MIN_SHELF_LIFE_DAYS,
            trace_window_days: DEFAULT_TRACE_WINDOW_DAYS,
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "database_url must not be empty"))]
    pub database_url: String,

    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment environment name
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum database connections in the pool
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, max = 512))]
    pub db_max_connections: u32,

    /// Minimum database connections kept open
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    #[serde(default)]
    #[validate]
    pub inventory: InventoryConfig,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

fn default_min_shelf_life_days() -> i64 {
    DEFAULT_MIN_SHELF_LIFE_DAYS
}

fn default_trace_window_days() -> i64 {
    DEFAULT_TRACE_WINDOW_DAYS
}

fn default_expiry_warning_days() -> i64 {
    DEFAULT_EXPIRY_WARNING_DAYS
}

impl AppConfig {
    /// Loads configuration from layered sources: `config/default.toml`, an
    /// environment-specific `config/{env}.toml`, then `FOODTRACE_*`
    /// environment variables (highest precedence).
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let mut builder = Config::builder();

        let default_path = Path::new(CONFIG_DIR).join("default.toml");
        builder = builder.add_source(File::from(default_path).required(false));

        let env_path = Path::new(CONFIG_DIR).join(format!("{}.toml", run_env));
        builder = builder.add_source(File::from(env_path).required(false));

        builder = builder.add_source(Environment::with_prefix("FOODTRACE").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        info!(
            environment = %config.environment,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Builds a configuration directly from a database URL, with defaults
    /// everywhere else. Used by tests and embedded callers.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            log_level: default_log_level(),
            environment: "test".to_string(),
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            inventory: InventoryConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
