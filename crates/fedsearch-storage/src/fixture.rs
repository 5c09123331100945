//! JSON fixture loading.
//!
//! A fixture file has two arrays:
//!
//! ```json
//! {
//!   "users": [ { "id": "1", "user_name": "admin", "is_admin": true } ],
//!   "records": [
//!     {
//!       "id": "a1",
//!       "module": "Accounts",
//!       "fields": { "name": "Acme Corp" }
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use fedsearch_core::{ActingIdentity, Record};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Users and records for the in-memory collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    /// Known users.
    #[serde(default)]
    pub users: Vec<ActingIdentity>,
    /// Records, in search order.
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Fixture {
    /// Load a fixture from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Fixture = serde_json::from_str(&raw).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Loaded fixture {}: {} users, {} records",
            path.display(),
            fixture.users.len(),
            fixture.records.len()
        );
        Ok(fixture)
    }
}
