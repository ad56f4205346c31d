//! Triumph Tracker error types

use thiserror::Error;

/// Triumph Tracker error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform API returned a non-success envelope
    #[error("Platform API error {code} ({status}): {message}")]
    Api {
        code: i32,
        status: String,
        message: String,
    },

    /// Player search did not resolve to a unique player
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// Manifest download or cache error
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Refresh requested before any successful search
    #[error("No player has been searched yet")]
    NoActiveQuery,

    /// Tracked-list persistence error
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Triumph Tracker operations
pub type Result<T> = std::result::Result<T, Error>;
