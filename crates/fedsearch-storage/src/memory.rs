//! In-memory record store and identity resolver.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use fedsearch_core::{
    ActingIdentity, Error, IdentityResolver, Record, RecordRef, RecordStore, RequestContext, Result,
};

use crate::fixture::Fixture;

fn poisoned<T>(table: &'static str) -> impl FnOnce(PoisonError<T>) -> Error {
    move |e| Error::backend(format!("{table} table poisoned: {e}"))
}

/// Read-mostly store of users and records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, ActingIdentity>>,
    records: RwLock<HashMap<RecordRef, Record>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding everything in `fixture`.
    pub fn from_fixture(fixture: &Fixture) -> crate::Result<Self> {
        let store = Self::new();
        for user in &fixture.users {
            store.insert_user(user.clone())?;
        }
        for record in &fixture.records {
            store.insert_record(record.clone())?;
        }
        Ok(store)
    }

    /// Add or replace a user, keyed by login name.
    pub fn insert_user(&self, user: ActingIdentity) -> crate::Result<()> {
        let mut users = self.users.write().map_err(poisoned("user"))?;
        users.insert(user.user_name.clone(), user);
        Ok(())
    }

    /// Add or replace a record.
    pub fn insert_record(&self, record: Record) -> crate::Result<()> {
        let mut records = self.records.write().map_err(poisoned("record"))?;
        records.insert(record.reference(), record);
        Ok(())
    }

    /// Number of records held.
    pub fn record_count(&self) -> crate::Result<usize> {
        let records = self.records.read().map_err(poisoned("record"))?;
        Ok(records.len())
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve(&self, user_name: &str) -> Result<Option<ActingIdentity>> {
        let users = self
            .users
            .read()
            .map_err(poisoned("user"))?;
        Ok(users.get(user_name).cloned())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn materialize(
        &self,
        ctx: &RequestContext,
        reference: &RecordRef,
        fields: &[String],
    ) -> Result<Record> {
        let records = self
            .records
            .read()
            .map_err(poisoned("record"))?;

        let stored = records
            .get(reference)
            .ok_or_else(|| Error::backend(format!("record {} not found", reference.qualified_id())))?;

        log::debug!(
            "[{}] Materializing {} ({} fields requested)",
            ctx.request_id(),
            reference.qualified_id(),
            fields.len()
        );

        let mut record = stored.clone();
        if !fields.is_empty() {
            record.fields.retain(|name, _| fields.contains(name));
        }
        Ok(record)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fedsearch_core::EmailAddressSet;
    use serde_json::json;
    use std::sync::Arc;

    fn admin() -> ActingIdentity {
        ActingIdentity {
            id: "1".into(),
            user_name: "admin".into(),
            is_admin: true,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(admin())
    }

    fn store() -> MemoryStore {
        MemoryStore::from_fixture(&Fixture {
            users: vec![admin()],
            records: vec![
                Record::new("Accounts", "a1")
                    .with_field("name", "Acme Corp")
                    .with_field("industry", "Anvils")
                    .with_field("phone_office", "555-0100"),
                Record::new("Contacts", "c1")
                    .with_field("last_name", "Smith")
                    .with_field("email", json!(["s@acme.test"]))
                    .with_email_address(EmailAddressSet::default()),
            ],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown_users() {
        let store = store();
        assert_eq!(store.resolve("admin").await.unwrap(), Some(admin()));
        assert_eq!(store.resolve("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_materialize_projects_requested_fields() {
        let record = store()
            .materialize(
                &ctx(),
                &RecordRef::new("Accounts", "a1"),
                &["name".to_string(), "missing".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields["name"], "Acme Corp");
    }

    #[tokio::test]
    async fn test_materialize_without_field_list_returns_everything() {
        let record = store()
            .materialize(&ctx(), &RecordRef::new("Accounts", "a1"), &[])
            .await
            .unwrap();
        assert_eq!(record.fields.len(), 3);
    }

    #[tokio::test]
    async fn test_materialize_keeps_email_substructure() {
        let record = store()
            .materialize(&ctx(), &RecordRef::new("Contacts", "c1"), &["email".to_string()])
            .await
            .unwrap();
        assert!(record.email_address.is_some());
        assert!(record.fields.contains_key("email"));
    }

    #[tokio::test]
    async fn test_materialize_unknown_record() {
        let err = store()
            .materialize(&ctx(), &RecordRef::new("Accounts", "zzz"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
    }

    #[test]
    fn test_insert_record_replaces() {
        let store = store();
        assert_eq!(store.record_count().unwrap(), 2);
        store.insert_record(Record::new("Accounts", "a1")).unwrap();
        assert_eq!(store.record_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_poisoned_tables_fail_reads_and_writes() {
        let store = Arc::new(store());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _users = holder.users.write().unwrap();
            let _records = holder.records.write().unwrap();
            panic!("writer died holding the locks");
        })
        .join();

        let err = store.insert_user(admin()).unwrap_err();
        assert!(matches!(err, crate::Error::Core(Error::Backend { .. })));
        let err = store
            .insert_record(Record::new("Accounts", "a9"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Core(Error::Backend { .. })));
        assert!(store.record_count().is_err());

        assert!(store.resolve("admin").await.is_err());
        assert!(
            store
                .materialize(&ctx(), &RecordRef::new("Accounts", "a1"), &[])
                .await
                .is_err()
        );
    }
}
