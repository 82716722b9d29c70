//! Shared error types for the summarization engine.
//!
//! Only configuration misuse and I/O surface as errors. Data-shape issues
//! (missing fields, empty groups) degrade to empty results instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for procsum operations
#[derive(Debug, Error)]
pub enum Error {
    /// Programmer-supplied configuration that can never be honoured
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Dataset could not be turned into records
    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Config file errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
