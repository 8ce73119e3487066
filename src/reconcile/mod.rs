//! Reconciliation engine
//!
//! Decides, for every table, whether it is unchanged, new, out of date or
//! orphaned, and what each case demands:
//!
//! | Classification | Action |
//! |---|---|
//! | Unchanged | compile, no store write |
//! | New | create version record, compile |
//! | VersionMismatch | fail with `MG_UNIMPLEMENTED_MIGRATION` |
//! | Orphaned | fail with `MG_ORPHANED_TABLE` |
//!
//! A pass either returns a complete [`ModelRegistry`](crate::model::ModelRegistry)
//! or a single [`ReconcileError`].

mod engine;
mod errors;
mod plan;

pub use engine::{reconcile, Reconciler};
pub use errors::{ReconcileError, ReconcileErrorCode, ReconcileResult};
pub use plan::{Classification, MigrationRequest, PlanEntry, ReconciliationPlan};
