//! Error types for fedsearch-storage

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fedsearch-storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fedsearch-storage
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fedsearch-core
    #[error("Core error: {0}")]
    Core(#[from] fedsearch_core::Error),

    /// Fixture file could not be read
    #[error("Failed to read fixture {}: {source}", .path.display())]
    Read {
        /// Fixture path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Fixture file is not valid fixture JSON
    #[error("Failed to parse fixture {}: {source}", .path.display())]
    Parse {
        /// Fixture path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}
