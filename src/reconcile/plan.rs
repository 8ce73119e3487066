//! Reconciliation plan
//!
//! Joins the loaded descriptors against the persisted version records and
//! assigns every table name exactly one [`Classification`]. The plan is
//! computed in full before any materialization work is admitted, so a plan
//! with a fatal entry never causes a store write.

use std::collections::BTreeMap;

use super::errors::{ReconcileError, ReconcileResult};
use crate::descriptor::{ModelDescriptor, UpgradeHook};
use crate::registry::PersistedVersionRecord;

/// Outcome of joining one table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Persisted and declared versions match
    Unchanged { version: u32 },
    /// No persisted record yet
    New { version: u32 },
    /// Persisted version differs from the descriptor
    VersionMismatch { persisted: i64, declared: u32 },
    /// Persisted record without a descriptor
    Orphaned { persisted: i64 },
}

impl Classification {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Classification::VersionMismatch { .. } | Classification::Orphaned { .. }
        )
    }

    /// Whether this entry produces a compiled model.
    pub fn materializes(&self) -> bool {
        !self.is_fatal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub table: String,
    pub classification: Classification,
}

/// Work a migrator would receive for a version mismatch.
///
/// Nothing executes these yet; a mismatch always fails the pass. A future
/// migrator must call `upgrade(document, from_version)` exactly once per
/// stored document and per version step, the hook must be idempotent, and
/// the persisted version advances only after every document was upgraded.
#[derive(Clone)]
pub struct MigrationRequest<'a> {
    pub table: &'a str,
    pub from_version: i64,
    pub to_version: u32,
    pub upgrade: Option<&'a UpgradeHook>,
}

impl MigrationRequest<'_> {
    /// The error reported while migrations are unsupported.
    pub fn unsupported(&self) -> ReconcileError {
        ReconcileError::unimplemented_migration(self.table, self.from_version, self.to_version)
    }
}

/// Per-table classifications for one pass.
///
/// Entries for persisted records come first, in persisted-record order,
/// followed by new tables in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    entries: Vec<PlanEntry>,
}

impl ReconciliationPlan {
    pub fn classify(
        descriptors: &BTreeMap<String, ModelDescriptor>,
        persisted: &[PersistedVersionRecord],
    ) -> Self {
        let mut remaining: BTreeMap<&str, u32> = descriptors
            .iter()
            .map(|(name, d)| (name.as_str(), d.version))
            .collect();

        let mut entries = Vec::with_capacity(descriptors.len() + persisted.len());

        for record in persisted {
            let classification = match remaining.remove(record.name.as_str()) {
                Some(declared) if i64::from(declared) == record.version => {
                    Classification::Unchanged { version: declared }
                }
                Some(declared) => Classification::VersionMismatch {
                    persisted: record.version,
                    declared,
                },
                None => Classification::Orphaned {
                    persisted: record.version,
                },
            };
            entries.push(PlanEntry {
                table: record.name.clone(),
                classification,
            });
        }

        for (name, version) in remaining {
            entries.push(PlanEntry {
                table: name.to_string(),
                classification: Classification::New { version },
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, table: &str) -> Option<Classification> {
        self.entries
            .iter()
            .find(|e| e.table == table)
            .map(|e| e.classification)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mismatched tables as migrator work items.
    pub fn migration_requests<'a>(
        &'a self,
        descriptors: &'a BTreeMap<String, ModelDescriptor>,
    ) -> Vec<MigrationRequest<'a>> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.classification {
                Classification::VersionMismatch { persisted, declared } => Some(MigrationRequest {
                    table: &entry.table,
                    from_version: persisted,
                    to_version: declared,
                    upgrade: descriptors
                        .get(&entry.table)
                        .and_then(|d| d.upgrade.as_ref()),
                }),
                _ => None,
            })
            .collect()
    }

    /// Fails with the first fatal entry, in persisted-record order.
    pub fn ensure_actionable(&self) -> ReconcileResult<()> {
        for entry in &self.entries {
            match entry.classification {
                Classification::VersionMismatch { persisted, declared } => {
                    return Err(ReconcileError::unimplemented_migration(
                        &entry.table,
                        persisted,
                        declared,
                    ));
                }
                Classification::Orphaned { persisted } => {
                    return Err(ReconcileError::orphaned_table(&entry.table, persisted));
                }
                Classification::Unchanged { .. } | Classification::New { .. } => {}
            }
        }
        Ok(())
    }
}
