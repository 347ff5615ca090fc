//! Process bootstrap helpers: layered configuration and logging.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, ApiConfig, AppConfig, CliArgs, ConfigError, DatabaseConfig,
    LoggingConfig, Section, ServerConfig,
};
