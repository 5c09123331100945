//! Auth-specific error types.

/// Errors that can occur in the credential gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header, or not a `Bearer ` credential.
    #[error("missing or invalid bearer token")]
    MissingToken,

    /// The credential does not match the stored hash.
    #[error("invalid bearer credential")]
    InvalidCredential,

    /// The configured administrative user does not exist.
    #[error("admin user not found: {user_name}")]
    AdminIdentityNotFound { user_name: String },

    /// Producing a credential hash failed.
    #[error("credential hashing failed: {0}")]
    Hashing(String),

    /// Verification could not run to completion.
    #[error("credential verification aborted: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::MissingToken | AuthError::InvalidCredential)
    }
}

impl From<AuthError> for fedsearch_core::Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidCredential => {
                fedsearch_core::Error::Unauthorized
            }
            AuthError::AdminIdentityNotFound { user_name } => {
                fedsearch_core::Error::AdminIdentityNotFound { user_name }
            }
            AuthError::Hashing(message) | AuthError::Internal(message) => {
                fedsearch_core::Error::backend(message)
            }
        }
    }
}
