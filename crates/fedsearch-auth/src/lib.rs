//! Credential gate for fedsearch.
//!
//! Provides:
//! - [`CredentialValidator`] - Trait for verifying a bearer credential and
//!   elevating the request to the administrative identity
//! - [`SharedSecretValidator`] - bcrypt-hash implementation of the trait
//! - [`AuthLayer`] / [`AuthService`] - Tower middleware parameterised over
//!   `CredentialValidator`
//! - [`AuthConfig`] - Configuration for the auth layer
//! - [`AuthError`] - Auth-specific error types
//!
//! The resolved identity is stored in the request's extensions, so the
//! elevation lives exactly as long as the request does.

mod error;
mod identity;
mod middleware;
mod shared_secret;

use std::future::Future;
use std::pin::Pin;

use fedsearch_core::ActingIdentity;

pub use error::AuthError;
pub use identity::{context_from_parts, identity_from_parts};
pub use middleware::{AuthLayer, AuthService};
pub use shared_secret::{SharedSecretValidator, hash_token};

/// Configuration for the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Whether the bearer check is enforced. When false, requests are
    /// elevated without presenting a credential (development only).
    pub enabled: bool,
    /// Login name of the administrative identity requests run as.
    pub admin_user: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_user: "admin".to_string(),
        }
    }
}

/// Boxed future returned by [`CredentialValidator`] methods.
pub type ValidationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ActingIdentity, AuthError>> + Send + 'a>>;

/// Trait for verifying a credential and resolving the acting identity.
///
/// The middleware calls `validate()` with the bearer token. Implementations
/// must only ever return the identity named by `config.admin_user`.
pub trait CredentialValidator: Send + Sync + 'static {
    /// Verify `token`, then resolve the administrative identity.
    fn validate(&self, token: &str, config: &AuthConfig) -> ValidationFuture<'_>;

    /// Resolve the administrative identity without a credential check.
    fn elevate(&self, config: &AuthConfig) -> ValidationFuture<'_>;
}
