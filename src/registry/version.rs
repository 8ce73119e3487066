//! Typed access to `_schema_data`
//!
//! [`VersionRegistry`] reads and writes [`PersistedVersionRecord`]s through any
//! [`DocumentStore`]. Store failures and records that do not parse as
//! `{name, version}` both surface as `MG_REGISTRY_UNAVAILABLE`.
//!
//! ```
//! use std::sync::Arc;
//! use modelgate::{MemoryStore, VersionRegistry};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = VersionRegistry::new(Arc::new(MemoryStore::new()));
//! let (record, created) = registry.find_or_create("points", 1).await.unwrap();
//! assert!(created);
//! assert_eq!(record.version, 1);
//! assert_eq!(registry.list_all().await.unwrap(), vec![record]);
//! # });
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reconcile::{ReconcileError, ReconcileResult};
use crate::store::DocumentStore;

/// Collection holding one version record per table.
pub const VERSION_COLLECTION: &str = "_schema_data";

/// Persisted schema version of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVersionRecord {
    pub name: String,
    /// Signed so that records written by other tools still parse; the
    /// loader only ever produces versions `>= 1`.
    pub version: i64,
}

impl PersistedVersionRecord {
    pub fn new(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    fn from_document(id: &str, document: Value) -> ReconcileResult<Self> {
        serde_json::from_value(document)
            .map_err(|e| ReconcileError::malformed_registry_record(id, e.to_string()))
    }

    fn to_document(&self) -> Value {
        serde_json::json!({ "name": self.name, "version": self.version })
    }
}

/// Typed view of the `_schema_data` collection.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    store: Arc<dyn DocumentStore>,
}

impl VersionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every persisted record, ordered by table name.
    ///
    /// # Errors
    ///
    /// `MG_REGISTRY_UNAVAILABLE` if the store fails or a record is malformed.
    pub async fn list_all(&self) -> ReconcileResult<Vec<PersistedVersionRecord>> {
        let documents = self
            .store
            .list(VERSION_COLLECTION)
            .await
            .map_err(|e| ReconcileError::registry_unavailable("list", None, e))?;

        let mut records = documents
            .into_iter()
            .map(|(id, doc)| {
                let record = PersistedVersionRecord::from_document(&id, doc)?;
                if record.name != id {
                    return Err(ReconcileError::malformed_registry_record(
                        &id,
                        format!("record is stored under id '{}' but names '{}'", id, record.name),
                    ));
                }
                Ok(record)
            })
            .collect::<ReconcileResult<Vec<_>>>()?;

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Returns the record for `name`, creating it at `default_version` when
    /// absent. The flag is `true` when this call created it.
    pub async fn find_or_create(
        &self,
        name: &str,
        default_version: u32,
    ) -> ReconcileResult<(PersistedVersionRecord, bool)> {
        let default = PersistedVersionRecord::new(name, i64::from(default_version));
        let (document, created) = self
            .store
            .find_or_create(VERSION_COLLECTION, name, default.to_document())
            .await
            .map_err(|e| ReconcileError::registry_unavailable("find_or_create", Some(name), e))?;

        let record = PersistedVersionRecord::from_document(name, document)?;
        Ok((record, created))
    }

    pub async fn get(&self, name: &str) -> ReconcileResult<Option<PersistedVersionRecord>> {
        let document = self
            .store
            .get(VERSION_COLLECTION, name)
            .await
            .map_err(|e| ReconcileError::registry_unavailable("get", Some(name), e))?;

        document
            .map(|doc| PersistedVersionRecord::from_document(name, doc))
            .transpose()
    }

    /// Writes the materialized version of `name`.
    pub async fn set_version(&self, name: &str, version: u32) -> ReconcileResult<()> {
        let record = PersistedVersionRecord::new(name, i64::from(version));
        self.store
            .put(VERSION_COLLECTION, name, record.to_document())
            .await
            .map_err(|e| ReconcileError::registry_unavailable("set_version", Some(name), e))
    }
}
