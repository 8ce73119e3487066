//! Model registry
//!
//! The result of a reconciliation pass: one [`CompiledModel`] per table,
//! keyed and iterated in table-name order.
//!
//! ```
//! use std::sync::Arc;
//! use modelgate::{reconcile, DescriptorSource, MemoryStore};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let source = DescriptorSource::new(
//!     "points.table.json",
//!     json!({"version": 1, "columns": {"lat": {"type": "Number"}}}),
//! );
//! let models = reconcile(Arc::new(MemoryStore::new()), vec![source]).await.unwrap();
//! assert_eq!(models.names().collect::<Vec<_>>(), ["points"]);
//! assert_eq!(models.summary()[0].version, 1);
//! # });
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::Serialize;

use super::compiled::CompiledModel;
use crate::schema::ColumnDescription;

/// Table name to compiled model, produced by one reconciliation pass.
///
/// Returned by value to the caller; nothing is kept globally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    models: BTreeMap<String, CompiledModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, model: CompiledModel) -> Option<CompiledModel> {
        self.models.insert(model.name().to_string(), model)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledModel> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Table names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CompiledModel> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Serializable overview: name, version and columns per table.
    pub fn summary(&self) -> Vec<ModelSummary<'_>> {
        self.models
            .values()
            .map(|model| ModelSummary {
                name: model.name(),
                version: model.version(),
                columns: model.columns(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ModelRegistry {
    type Item = (&'a String, &'a CompiledModel);
    type IntoIter = btree_map::Iter<'a, String, CompiledModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

#[derive(Debug, Serialize)]
pub struct ModelSummary<'a> {
    pub name: &'a str,
    pub version: u32,
    pub columns: &'a BTreeMap<String, ColumnDescription>,
}
