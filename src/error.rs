//! Error types for the glasses tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A landmark required by the pipeline is absent from the face
    #[error("Missing landmark at index {0}")]
    MissingLandmark(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// YAML or JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pose strategy construction error
    #[error("Strategy error: {0}")]
    StrategyError(String),

    /// Tracking worker lifecycle error
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
