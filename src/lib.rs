//! modelgate - declarative table descriptors reconciled against a document store
//!
//! A pass reads the persisted schema versions, validates the descriptor set,
//! classifies every table and returns a registry of compiled models, or one
//! fatal error and no registry at all.

pub mod cli;
pub mod descriptor;
pub mod model;
pub mod observability;
pub mod reconcile;
pub mod registry;
pub mod schema;
pub mod store;

pub use descriptor::{DescriptorSource, ModelDescriptor, UpgradeHook};
pub use model::{CompiledModel, ModelError, ModelRegistry};
pub use reconcile::{reconcile, ReconcileError, ReconcileErrorCode, ReconcileResult, Reconciler};
pub use registry::{PersistedVersionRecord, VersionRegistry};
pub use schema::TimestampMode;
pub use store::{DocumentStore, FileStore, MemoryStore};
