//! Error types for the State Lens core
//!
//! Normalization itself never fails: malformed source values degrade to
//! typed fallback variants. These errors only arise at the boundary, while
//! reading files and decoding text into a source graph or configuration.

use std::path::PathBuf;

use thiserror::Error;

/// State Lens boundary error types
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input or output text is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file is malformed or holds an invalid option
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for State Lens operations
pub type Result<T> = std::result::Result<T, Error>;
