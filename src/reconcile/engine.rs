//! Reconciliation engine
//!
//! One pass:
//! 1. Read every persisted version record (ordering barrier)
//! 2. Validate the descriptor set
//! 3. Classify every table and fail on the first fatal entry
//! 4. Materialize unchanged and new tables concurrently on a `JoinSet`
//! 5. Join once and return the model registry
//!
//! Any failure aborts the pass. Tasks still running are shut down and their
//! results discarded.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::debug;

use super::errors::{ReconcileError, ReconcileResult};
use super::plan::{Classification, ReconciliationPlan};
use crate::descriptor::{load_descriptors, DescriptorSource, ModelDescriptor};
use crate::model::{CompiledModel, ModelRegistry};
use crate::observability::{log_event_with_fields, Event};
use crate::registry::VersionRegistry;
use crate::schema::{SchemaCompiler, TimestampMode};
use crate::store::DocumentStore;

/// Runs reconciliation passes against one document store.
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: VersionRegistry,
    compiler: SchemaCompiler,
}

impl Reconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            registry: VersionRegistry::new(store),
            compiler: SchemaCompiler::default(),
        }
    }

    pub fn with_timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.compiler = SchemaCompiler::new(mode);
        self
    }

    pub fn timestamp_mode(&self) -> TimestampMode {
        self.compiler.mode()
    }

    pub fn version_registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// Runs a full pass over `sources`.
    pub async fn run(
        &self,
        sources: impl IntoIterator<Item = DescriptorSource>,
    ) -> ReconcileResult<ModelRegistry> {
        let started = Instant::now();
        log_event_with_fields(Event::ReconcileStart, &[]);

        match self.run_pass(sources).await {
            Ok(models) => {
                let tables = models.len().to_string();
                let elapsed = started.elapsed().as_millis().to_string();
                log_event_with_fields(
                    Event::ReconcileComplete,
                    &[("tables", tables.as_str()), ("elapsed_ms", elapsed.as_str())],
                );
                Ok(models)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::ReconcileFailed,
                    &[("code", e.code().code()), ("reason", e.message())],
                );
                Err(e)
            }
        }
    }

    /// Validates the descriptor set without touching the store.
    pub fn check(
        sources: impl IntoIterator<Item = DescriptorSource>,
    ) -> ReconcileResult<BTreeMap<String, ModelDescriptor>> {
        load_descriptors(sources)
    }

    async fn run_pass(
        &self,
        sources: impl IntoIterator<Item = DescriptorSource>,
    ) -> ReconcileResult<ModelRegistry> {
        let persisted = self.registry.list_all().await?;
        let count = persisted.len().to_string();
        log_event_with_fields(Event::VersionsLoaded, &[("records", count.as_str())]);

        let mut descriptors = load_descriptors(sources)?;
        let count = descriptors.len().to_string();
        log_event_with_fields(Event::DescriptorsLoaded, &[("descriptors", count.as_str())]);

        let plan = ReconciliationPlan::classify(&descriptors, &persisted);
        log_plan(&plan);
        plan.ensure_actionable()?;

        let mut tasks = JoinSet::new();
        for entry in plan.entries() {
            let descriptor = descriptors.remove(&entry.table).ok_or_else(|| {
                ReconcileError::internal(Some(&entry.table), "planned table has no descriptor")
            })?;
            let compiler = self.compiler;

            match entry.classification {
                Classification::Unchanged { .. } => {
                    tasks.spawn(async move { Ok(CompiledModel::compile(&descriptor, &compiler)) });
                }
                Classification::New { .. } => {
                    let registry = self.registry.clone();
                    tasks.spawn(materialize_new(registry, compiler, descriptor));
                }
                Classification::VersionMismatch { .. } | Classification::Orphaned { .. } => {
                    return Err(ReconcileError::internal(
                        Some(&entry.table),
                        "fatal classification admitted for materialization",
                    ));
                }
            }
        }

        let mut models = ModelRegistry::new();
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| ReconcileError::internal(None, format!("materialization task failed: {}", e)))
                .and_then(|r| r);

            match result {
                Ok(model) => {
                    let version = model.version().to_string();
                    log_event_with_fields(
                        Event::TableMaterialized,
                        &[("table", model.name()), ("version", version.as_str())],
                    );
                    models.insert(model);
                }
                Err(e) => {
                    tasks.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok(models)
    }
}

/// Creates the version record of a new table and compiles its model.
///
/// The record is written through `find_or_create`, so concurrent passes
/// agree on one record. A record found at another version means a different
/// descriptor won the race.
async fn materialize_new(
    registry: VersionRegistry,
    compiler: SchemaCompiler,
    descriptor: ModelDescriptor,
) -> ReconcileResult<CompiledModel> {
    let (record, created) = registry
        .find_or_create(&descriptor.name, descriptor.version)
        .await?;

    if record.version != i64::from(descriptor.version) {
        return Err(ReconcileError::unimplemented_migration(
            &descriptor.name,
            record.version,
            descriptor.version,
        ));
    }
    debug!(table = %descriptor.name, created, "version record ready");

    let model = CompiledModel::compile(&descriptor, &compiler);
    registry.set_version(&descriptor.name, descriptor.version).await?;

    Ok(model)
}

fn log_plan(plan: &ReconciliationPlan) {
    for entry in plan.entries() {
        let table = entry.table.as_str();
        match entry.classification {
            Classification::Unchanged { version } => {
                let version = version.to_string();
                log_event_with_fields(Event::TableUnchanged, &[("table", table), ("version", version.as_str())]);
            }
            Classification::New { version } => {
                let version = version.to_string();
                log_event_with_fields(Event::TableNew, &[("table", table), ("version", version.as_str())]);
            }
            Classification::VersionMismatch { persisted, declared } => {
                let persisted = persisted.to_string();
                let declared = declared.to_string();
                log_event_with_fields(
                    Event::TableVersionMismatch,
                    &[
                        ("table", table),
                        ("persisted_version", persisted.as_str()),
                        ("declared_version", declared.as_str()),
                    ],
                );
            }
            Classification::Orphaned { persisted } => {
                let persisted = persisted.to_string();
                log_event_with_fields(
                    Event::TableOrphaned,
                    &[("table", table), ("persisted_version", persisted.as_str())],
                );
            }
        }
    }
}

/// Runs one pass with default settings.
pub async fn reconcile(
    store: Arc<dyn DocumentStore>,
    sources: impl IntoIterator<Item = DescriptorSource>,
) -> ReconcileResult<ModelRegistry> {
    Reconciler::new(store).run(sources).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ReconcileErrorCode;
    use crate::registry::VERSION_COLLECTION;
    use crate::schema::UPDATED_AT;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn source(name: &str, version: u32) -> DescriptorSource {
        DescriptorSource::new(
            format!("{}.table.json", name),
            json!({
                "version": version,
                "columns": {
                    "lat": {"type": "Number", "required": true},
                    "updatedAt": {"type": "Date"}
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_new_table_gets_version_record() {
        let store = Arc::new(MemoryStore::new());
        let models = reconcile(store.clone(), vec![source("points", 1)]).await.unwrap();

        assert!(models.get("points").unwrap().requires("lat"));
        let record = store.get(VERSION_COLLECTION, "points").await.unwrap().unwrap();
        assert_eq!(record, json!({"name": "points", "version": 1}));
    }

    #[tokio::test]
    async fn test_second_pass_is_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let first = reconcile(store.clone(), vec![source("points", 1)]).await.unwrap();
        let second = reconcile(store.clone(), vec![source("points", 1)]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count(VERSION_COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn test_version_bump_fails() {
        let store = Arc::new(MemoryStore::new());
        reconcile(store.clone(), vec![source("points", 1)]).await.unwrap();

        let err = reconcile(store, vec![source("points", 2)]).await.unwrap_err();
        assert_eq!(err.code(), ReconcileErrorCode::UnimplementedMigration);
        assert_eq!(err.persisted_version(), Some(1));
        assert_eq!(err.declared_version(), Some(2));
    }

    #[tokio::test]
    async fn test_timestamp_mode_flows_into_models() {
        let store = Arc::new(MemoryStore::new());
        let descriptor = DescriptorSource::new(
            "zones.table.json",
            json!({"version": 1, "columns": {"label": {"type": "String"}}}),
        );

        let reconciler = Reconciler::new(store).with_timestamp_mode(TimestampMode::Symmetric);
        let models = reconciler.run(vec![descriptor]).await.unwrap();
        assert!(models.get("zones").unwrap().columns().contains_key(UPDATED_AT));
    }

    #[tokio::test]
    async fn test_concurrent_record_with_other_version() {
        let store = Arc::new(MemoryStore::new());
        let registry = VersionRegistry::new(store.clone());
        let descriptor = load_descriptors(vec![source("points", 2)])
            .unwrap()
            .remove("points")
            .unwrap();

        registry.find_or_create("points", 1).await.unwrap();
        let err = materialize_new(registry, SchemaCompiler::default(), descriptor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReconcileErrorCode::UnimplementedMigration);
    }

    #[test]
    fn test_check_is_pure() {
        let descriptors = Reconciler::check(vec![source("points", 1), source("zones", 3)]).unwrap();
        assert_eq!(descriptors.len(), 2);
    }
}
