//! Model registry
//!
//! The output of a reconciliation pass: one [`CompiledModel`] per table,
//! keyed by table name. Models are usable for record operations against the
//! same document store the pass ran on.

mod compiled;
mod errors;
mod registry;

pub use compiled::CompiledModel;
pub use errors::{ModelError, ModelResult};
pub use registry::{ModelRegistry, ModelSummary};
