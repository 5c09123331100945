//! Error types for fedsearch-core
//!
//! The first five variants form the taxonomy every request outcome is
//! classified into. The remaining variants are produced by collaborators and
//! startup code, and are reclassified before they reach an HTTP caller.

use thiserror::Error;

/// Result type alias for fedsearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fedsearch
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Missing or malformed bearer credential, or credential hash mismatch.
    #[error("Unauthorized")]
    Unauthorized,

    /// The configured administrative identity does not exist.
    #[error("Admin user not found: {user_name}")]
    AdminIdentityNotFound {
        /// Lookup key that failed to resolve
        user_name: String,
    },

    /// A required request parameter is absent or blank.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name as it appears on the wire
        name: String,
    },

    /// The search engine is reachable but reports itself unavailable.
    #[error("Search engine is unavailable")]
    SearchUnavailable,

    /// Any other failure acquiring the engine or executing the query.
    ///
    /// Carries no detail on purpose; the cause is logged where it is caught.
    #[error("Search engine runtime error")]
    SearchRuntime,

    /// Failure reported by a collaborator (engine, record store, resolver).
    #[error("Backend error: {message}")]
    Backend {
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error (fixture and config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new missing-parameter error.
    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        Error::MissingParameter { name: name.into() }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Unauthorized | Error::MissingParameter { .. })
    }

    /// Short machine-readable category used in error envelopes.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Unauthorized => "authentication",
            Error::AdminIdentityNotFound { .. } => "configuration",
            Error::MissingParameter { .. } => "request",
            Error::SearchUnavailable => "search_unavailable",
            Error::SearchRuntime => "search_runtime",
            Error::Backend { .. } => "backend",
            Error::Config { .. } => "configuration",
            Error::Io(_) | Error::Json(_) => "internal",
        }
    }
}
