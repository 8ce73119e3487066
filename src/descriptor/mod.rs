//! Descriptor loader subsystem
//!
//! Descriptors are declarative table definitions: a version number, a column
//! map and per-table options. They are usually read from
//! `<descriptor_dir>/<table>.table.json` but can be built in code, which is
//! also the only way to attach an upgrade hook.

mod loader;
mod types;

pub use loader::{
    coerce_version, load_descriptors, read_dir, table_name, DescriptorLoader, DEFAULT_SUFFIX,
};
pub use types::{DescriptorSource, ModelDescriptor, UpgradeHook};
