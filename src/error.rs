// src/error.rs

//! Unified error handling for the monitor.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Discovery of the source's units failed; fatal for the run
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Fetching a single unit failed; the unit is skipped for this run
    #[error("Fetch error for {locator}: {message}")]
    Fetch { locator: String, message: String },

    /// The persisted snapshot exists but cannot be read into the current shape
    #[error("Corrupt state file {path}: {message}")]
    CorruptState { path: String, message: String },

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notify(String),

    /// No adapter is registered under this name
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Unit count dropped too far compared to the previous snapshot
    #[error(
        "Circuit breaker triggered: {previous_count} -> {current_count} units \
         ({drop_percent:.1}% drop > {threshold_percent}% threshold)"
    )]
    CircuitBreakerTriggered {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
        threshold_percent: u8,
    },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a discovery error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery(message.into())
    }

    /// Create a fetch error for a unit locator.
    pub fn fetch(locator: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    /// Create a corrupt-state error for a snapshot file.
    pub fn corrupt_state(path: &Path, message: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }
}
