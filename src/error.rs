//! Error handling for flowproc
//!
//! This module defines the crate-level error type used by the configuration
//! layer and by snapshot serialization. Lifecycle and port errors live in
//! [`crate::pipeline::ProcessError`], which wraps this type.

use thiserror::Error;

/// Main error type for configuration and serialization operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// A lookup named a key nobody declared
    #[error("Unknown configuration key: {0}")]
    UnknownConfigKey(String),

    /// A key was declared twice on the same process
    #[error("Duplicate configuration key: {0}")]
    DuplicateConfigKey(String),

    /// A stored string could not be converted to the requested type
    #[error("Bad value conversion for '{key}' (value '{value}'): {reason}")]
    BadValueConversion {
        key: String,
        value: String,
        reason: String,
    },

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context layers and return the underlying error.
    pub fn root(&self) -> &FlowError {
        match self {
            FlowError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for flowproc configuration operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
