//! Shared-secret credential validation.
//!
//! The caller presents a shared secret, not a personal credential. It is
//! checked against a bcrypt hash, and on success the request is elevated to
//! the configured administrative user.

use std::sync::Arc;

use fedsearch_core::{ActingIdentity, IdentityResolver};

use crate::{AuthConfig, AuthError, CredentialValidator, ValidationFuture};

/// Bcrypt-backed [`CredentialValidator`].
pub struct SharedSecretValidator {
    bearer_hash: String,
    resolver: Arc<dyn IdentityResolver>,
}

impl SharedSecretValidator {
    /// Create a validator for the given bcrypt hash.
    pub fn new(bearer_hash: impl Into<String>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            bearer_hash: bearer_hash.into(),
            resolver,
        }
    }

    /// Check `token` against the stored hash.
    ///
    /// Runs on the blocking pool; bcrypt is deliberately slow. A stored hash
    /// that bcrypt cannot parse verifies as a mismatch.
    async fn verify_token(&self, token: &str) -> Result<(), AuthError> {
        let token = token.to_string();
        let hash = self.bearer_hash.clone();

        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(token, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        match verified {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::InvalidCredential),
            Err(e) => {
                log::warn!("Stored bearer hash is unusable: {e}");
                Err(AuthError::InvalidCredential)
            }
        }
    }

    /// Resolve the administrative identity by login name.
    async fn resolve_admin(&self, user_name: &str) -> Result<ActingIdentity, AuthError> {
        let not_found = || AuthError::AdminIdentityNotFound {
            user_name: user_name.to_string(),
        };

        match self.resolver.resolve(user_name).await {
            Ok(Some(identity)) if identity.user_name == user_name => Ok(identity),
            Ok(Some(identity)) => {
                log::error!(
                    "Identity lookup for '{user_name}' returned '{}'",
                    identity.user_name
                );
                Err(not_found())
            }
            Ok(None) => Err(not_found()),
            Err(e) => {
                log::error!("Identity lookup for '{user_name}' failed: {e}");
                Err(not_found())
            }
        }
    }
}

impl CredentialValidator for SharedSecretValidator {
    fn validate(&self, token: &str, config: &AuthConfig) -> ValidationFuture<'_> {
        let token = token.to_string();
        let admin_user = config.admin_user.clone();
        Box::pin(async move {
            self.verify_token(&token).await?;
            self.resolve_admin(&admin_user).await
        })
    }

    fn elevate(&self, config: &AuthConfig) -> ValidationFuture<'_> {
        let admin_user = config.admin_user.clone();
        Box::pin(async move { self.resolve_admin(&admin_user).await })
    }
}

impl std::fmt::Debug for SharedSecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretValidator")
            .field("bearer_hash", &"<redacted>")
            .finish()
    }
}

/// Hash a token for provisioning `bearer_hash`.
pub fn hash_token(token: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(token, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    // Lowest cost bcrypt accepts, to keep tests fast.
    const TEST_COST: u32 = 4;

    struct TestResolver {
        known: Option<ActingIdentity>,
        fail: bool,
    }

    #[async_trait]
    impl IdentityResolver for TestResolver {
        async fn resolve(&self, user_name: &str) -> fedsearch_core::Result<Option<ActingIdentity>> {
            if self.fail {
                return Err(fedsearch_core::Error::backend("store offline"));
            }
            Ok(self
                .known
                .clone()
                .filter(|identity| identity.user_name == user_name))
        }
    }

    fn admin() -> ActingIdentity {
        ActingIdentity {
            id: "1".to_string(),
            user_name: "admin".to_string(),
            is_admin: true,
        }
    }

    fn validator(known: Option<ActingIdentity>) -> SharedSecretValidator {
        let hash = hash_token("s3cret", TEST_COST).unwrap();
        SharedSecretValidator::new(hash, Arc::new(TestResolver { known, fail: false }))
    }

    #[tokio::test]
    async fn test_valid_token_elevates_to_admin() {
        let v = validator(Some(admin()));
        let identity = v.validate("s3cret", &AuthConfig::default()).await.unwrap();
        assert_eq!(identity, admin());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let v = validator(Some(admin()));
        let err = v.validate("guess", &AuthConfig::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_wrong_token_never_resolves_identity() {
        let hash = hash_token("s3cret", TEST_COST).unwrap();
        let v = SharedSecretValidator::new(
            hash,
            Arc::new(TestResolver {
                known: None,
                fail: true,
            }),
        );
        let err = v.validate("guess", &AuthConfig::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_missing_admin_is_reported() {
        let v = validator(None);
        let err = v.validate("s3cret", &AuthConfig::default()).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::AdminIdentityNotFound { ref user_name } if user_name == "admin"
        ));
    }

    #[tokio::test]
    async fn test_only_configured_admin_is_bound() {
        let v = validator(Some(admin()));
        let config = AuthConfig {
            enabled: true,
            admin_user: "someone-else".to_string(),
        };
        let err = v.validate("s3cret", &config).await.unwrap_err();
        assert!(matches!(err, AuthError::AdminIdentityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolver_failure_is_admin_not_found() {
        let hash = hash_token("s3cret", TEST_COST).unwrap();
        let v = SharedSecretValidator::new(
            hash,
            Arc::new(TestResolver {
                known: None,
                fail: true,
            }),
        );
        let err = v.validate("s3cret", &AuthConfig::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::AdminIdentityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        let v = SharedSecretValidator::new(
            "not-a-bcrypt-hash",
            Arc::new(TestResolver {
                known: Some(admin()),
                fail: false,
            }),
        );
        let err = v.validate("s3cret", &AuthConfig::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_elevate_skips_credential() {
        let v = validator(Some(admin()));
        let identity = v.elevate(&AuthConfig::default()).await.unwrap();
        assert_eq!(identity.user_name, "admin");
    }

    #[test]
    fn test_php_style_2y_hash_verifies() {
        let hash = hash_token("s3cret", TEST_COST).unwrap();
        let php_hash = hash.replacen("$2b$", "$2y$", 1);
        assert!(bcrypt::verify("s3cret", &php_hash).unwrap());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let v = validator(None);
        let debug = format!("{v:?}");
        assert!(!debug.contains("$2"));
    }
}
