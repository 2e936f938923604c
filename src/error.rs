//! Error types for the preview coordinator

use thiserror::Error;

/// Result type alias for preview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while coordinating a preview
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No file was selected, or the file does not carry the UI extension
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The rasterizer executable could not be started
    #[error("Failed to launch rasterizer: {0}")]
    ProcessLaunchFailure(String),

    /// The rasterizer ran but reported failure
    #[error("Rasterizer failed: {0}")]
    ProcessExecutionFailure(String),

    /// Captured output exceeded the configured cap
    #[error("Rasterizer output exceeded {limit} bytes")]
    BufferExceeded { limit: usize },

    /// The rasterizer did not finish in time
    #[error("Rasterizer timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The panel host refused an operation
    #[error("Panel error: {0}")]
    Panel(String),

    /// Watching files for saves failed
    #[error("Watch error: {0}")]
    Watch(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Text shown to the user when this error ends a render.
    ///
    /// Execution failures carry the rasterizer's own diagnostics, which are
    /// shown without any prefix.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::ProcessExecutionFailure(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
