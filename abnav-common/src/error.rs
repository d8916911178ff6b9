//! Common error types for abnav

use thiserror::Error;

/// Common result type for abnav operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the abnav crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Publication manifest could not be parsed
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
