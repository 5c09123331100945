//! Error types for fedsearch-api

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Result type alias for fedsearch-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fedsearch-api
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fedsearch-core
    #[error(transparent)]
    Core(#[from] fedsearch_core::Error),

    /// Error from fedsearch-storage
    #[error("Storage error: {0}")]
    Storage(#[from] fedsearch_storage::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server could not bind or run
    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        use fedsearch_core::Error as Core;
        match self {
            Self::Core(Core::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Core(Core::MissingParameter { .. }) => StatusCode::BAD_REQUEST,
            Self::Core(Core::SearchUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::Core(e) => e.category(),
            Self::Config(_) => "configuration",
            Self::Storage(_) | Self::Server(_) => "internal",
        }
    }

    /// Message safe to hand to a client.
    ///
    /// Only taxonomy errors are described; everything else gets a fixed
    /// message and the detail goes to the log.
    fn public_message(&self) -> String {
        use fedsearch_core::Error as Core;
        match self {
            Self::Core(
                e @ (Core::Unauthorized
                | Core::MissingParameter { .. }
                | Core::SearchUnavailable
                | Core::SearchRuntime
                | Core::AdminIdentityNotFound { .. }),
            ) => e.to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }

        let body = json!({
            "error": {
                "category": self.category(),
                "message": self.public_message(),
            }
        });

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                http::header::WWW_AUTHENTICATE,
                http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
