//! Collaborator traits.
//!
//! The pipeline talks to record storage and identity lookup only through
//! these traits. Implementations must be safe for concurrent use: one
//! instance is shared by every in-flight request.

use async_trait::async_trait;

use crate::Result;
use crate::model::{ActingIdentity, Record, RecordRef, RequestContext};

/// Resolves a lookup key into a user identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Look up a user by login name.
    ///
    /// Returns `Ok(None)` when no such user exists.
    async fn resolve(&self, user_name: &str) -> Result<Option<ActingIdentity>>;
}

/// Materializes records from storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the record behind `reference`, populating only `fields`.
    ///
    /// An empty `fields` slice means no field restriction.
    async fn materialize(
        &self,
        ctx: &RequestContext,
        reference: &RecordRef,
        fields: &[String],
    ) -> Result<Record>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Arc;

    struct FixedResolver;

    #[async_trait]
    impl IdentityResolver for FixedResolver {
        async fn resolve(&self, user_name: &str) -> Result<Option<ActingIdentity>> {
            Ok((user_name == "admin").then(|| ActingIdentity {
                id: "1".into(),
                user_name: "admin".into(),
                is_admin: true,
            }))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn materialize(
            &self,
            _ctx: &RequestContext,
            reference: &RecordRef,
            _fields: &[String],
        ) -> Result<Record> {
            Err(Error::backend(format!("no record {}", reference.qualified_id())))
        }
    }

    #[tokio::test]
    async fn test_resolver_as_trait_object() {
        let resolver: Arc<dyn IdentityResolver> = Arc::new(FixedResolver);
        assert!(resolver.resolve("admin").await.unwrap().is_some());
        assert!(resolver.resolve("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store: Arc<dyn RecordStore> = Arc::new(FailingStore);
        let ctx = RequestContext::new(ActingIdentity {
            id: "1".into(),
            user_name: "admin".into(),
            is_admin: true,
        });
        let err = store
            .materialize(&ctx, &RecordRef::new("Accounts", "x"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
    }
}
