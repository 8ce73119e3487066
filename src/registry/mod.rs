//! Version registry
//!
//! Persisted `(table, version)` pairs, one document per table in the
//! `_schema_data` collection with the table name as document id. This is the
//! single source of truth for which schema version is materialized.
//!
//! Records are created on first materialization, changed only through
//! reconciliation and never deleted.

mod version;

pub use version::{PersistedVersionRecord, VersionRegistry, VERSION_COLLECTION};
