//! Descriptor types
//!
//! A descriptor body has the shape
//!
//! ```json
//! {
//!   "version": 1,
//!   "columns": { "lat": { "type": "Number", "required": true } },
//!   "extraOptions": { "updatedAt": false }
//! }
//! ```
//!
//! The table name is not part of the body; it is derived from the source
//! identifier (`points.table.json` → `points`).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::schema::{ColumnSpec, ExtraOptions};

/// Migration hook: `upgrade(data, from_version) -> data`.
///
/// A migrator invoking it must treat it as idempotent and call it exactly
/// once per version step.
///
/// `from_version` is the persisted version, which is `i64` like every
/// version read back from the store.
pub type UpgradeHook = Arc<dyn Fn(Value, i64) -> Value + Send + Sync>;

/// One raw descriptor as fed to the loader.
#[derive(Clone)]
pub struct DescriptorSource {
    /// Where the descriptor came from, usually a file name
    pub identifier: String,
    /// Parsed descriptor body
    pub body: Value,
    pub upgrade: Option<UpgradeHook>,
}

impl DescriptorSource {
    pub fn new(identifier: impl Into<String>, body: Value) -> Self {
        Self {
            identifier: identifier.into(),
            body,
            upgrade: None,
        }
    }

    pub fn with_upgrade(mut self, upgrade: UpgradeHook) -> Self {
        self.upgrade = Some(upgrade);
        self
    }
}

impl fmt::Debug for DescriptorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSource")
            .field("identifier", &self.identifier)
            .field("body", &self.body)
            .field("upgrade", &self.upgrade.is_some())
            .finish()
    }
}

/// Validated definition of one table.
#[derive(Clone)]
pub struct ModelDescriptor {
    /// Sanitized table name, unique across a load
    pub name: String,
    /// Identifier of the source this was loaded from
    pub source_id: String,
    /// Always >= 1
    pub version: u32,
    /// Never empty
    pub columns: BTreeMap<String, ColumnSpec>,
    pub extra_options: ExtraOptions,
    pub upgrade: Option<UpgradeHook>,
}

impl ModelDescriptor {
    pub fn has_upgrade(&self) -> bool {
        self.upgrade.is_some()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("source_id", &self.source_id)
            .field("version", &self.version)
            .field("columns", &self.columns)
            .field("extra_options", &self.extra_options)
            .field("upgrade", &self.upgrade.is_some())
            .finish()
    }
}
