//! Document store subsystem
//!
//! The store holds JSON documents grouped into named collections and keyed by
//! a string id. It is the only seam between reconciliation and persistence:
//! the version registry and compiled models talk to a `DocumentStore` and
//! never touch files directly.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: process-local, used by tests and dry runs
//! - [`FileStore`]: append-only record file with CRC32 checksums, replayed
//!   into memory on open
//!
//! # Guarantees
//!
//! - `find_or_create` is atomic per `(collection, id)`: concurrent callers for
//!   the same id observe exactly one created document
//! - `list` returns documents ordered by id

mod checksum;
mod errors;
mod file;
mod memory;
mod record;

pub use checksum::compute_checksum;
pub use errors::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::DocumentRecord;

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

/// Documents of one collection, keyed by id.
pub type Collection = BTreeMap<String, Value>;

/// Async document-store driver contract.
#[async_trait]
pub trait DocumentStore: Debug + Send + Sync + 'static {
    /// Returns the stored document, or stores `default` under `id` and returns
    /// it. The flag is `true` when the document was created by this call.
    async fn find_or_create(
        &self,
        collection: &str,
        id: &str,
        default: Value,
    ) -> StoreResult<(Value, bool)>;

    /// Fetches one document.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Inserts or replaces a full document.
    async fn put(&self, collection: &str, id: &str, document: Value) -> StoreResult<()>;

    /// Full scan of a collection, ordered by id.
    async fn list(&self, collection: &str) -> StoreResult<Vec<(String, Value)>>;
}

/// Applies find-or-create semantics to an in-memory collection map.
///
/// Shared by both implementations so their visible behaviour is identical.
pub(crate) fn find_or_insert(
    collections: &mut BTreeMap<String, Collection>,
    collection: &str,
    id: &str,
    default: Value,
) -> (Value, bool) {
    let docs = collections.entry(collection.to_string()).or_default();
    match docs.get(id) {
        Some(existing) => (existing.clone(), false),
        None => {
            docs.insert(id.to_string(), default.clone());
            (default, true)
        }
    }
}

pub(crate) fn list_collection(
    collections: &BTreeMap<String, Collection>,
    collection: &str,
) -> Vec<(String, Value)> {
    collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .map(|(id, doc)| (id.clone(), doc.clone()))
                .collect()
        })
        .unwrap_or_default()
}
