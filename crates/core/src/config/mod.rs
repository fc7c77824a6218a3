mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str, ConfigFormat};
pub use types::*;
pub use validate::{validate_config, MAX_TTL_HOURS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration file is empty: {0}")]
    Empty(String),

    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
