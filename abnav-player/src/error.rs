//! Error types for abnav-player
//!
//! Navigation itself reports failures as `bool`; these errors cover loading
//! publications and configuration and running a playback session.

use thiserror::Error;

/// Main error type for abnav-player
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest, config or URL errors from the shared library
    #[error(transparent)]
    Common(#[from] abnav_common::Error),

    /// Invalid session settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session could not start or continue
    #[error("Playback error: {0}")]
    Playback(String),
}

/// Convenience Result type using abnav-player Error
pub type Result<T> = std::result::Result<T, Error>;
