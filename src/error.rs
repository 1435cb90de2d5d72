use thiserror::Error;

/// Main error type for the simulation
#[derive(Error, Debug)]
pub enum RopewarError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for RopewarError
pub type Result<T> = std::result::Result<T, RopewarError>;
