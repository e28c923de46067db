//! Unified error handling for the trackgen library.
//!
//! Degenerate geometry and out-of-range pace are never errors; they are
//! reported through [`crate::events`] and handled by fallbacks. What remains
//! here is configuration trouble, file trouble, and cooperative cancellation.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for track generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Configuration is unusable (bad values, no waypoints, bad schedule)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Route file is missing or unreadable
    #[error("Route file '{}' could not be read: {message}", path.display())]
    RouteFile { path: PathBuf, message: String },

    /// Route source parsed to zero coordinates
    #[error("Route '{source_name}' is empty or contains no valid coordinates")]
    EmptyRoute { source_name: String },

    /// The caller's stop check signalled during generation
    #[error("Generation stopped")]
    Stopped,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        GenerationError::Config {
            message: message.into(),
        }
    }

    /// True for the cancellation outcome, which callers usually report
    /// differently from a failure.
    pub fn is_stopped(&self) -> bool {
        matches!(self, GenerationError::Stopped)
    }
}

/// Result type alias for trackgen operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Extension trait for converting Option to GenerationError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a configuration error.
    fn ok_or_config(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_config(self, message: &str) -> Result<T> {
        self.ok_or_else(|| GenerationError::config(message))
    }
}
