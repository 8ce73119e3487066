//! Compiled models
//!
//! A [`CompiledModel`] binds a table name and version to its compiled schema
//! and exposes the record operations that go through that schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::errors::{ModelError, ModelResult};
use crate::descriptor::ModelDescriptor;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{
    json_type_name, ColumnDescription, CompiledSchema, SchemaCompiler, SchemaError, ID_FIELD,
    REVISION_FIELD,
};
use crate::store::{DocumentStore, StoreError};

/// Runtime model for one table, built fresh on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    name: String,
    version: u32,
    schema: Arc<CompiledSchema>,
    columns: BTreeMap<String, ColumnDescription>,
}

impl CompiledModel {
    pub fn new(name: impl Into<String>, version: u32, schema: CompiledSchema) -> Self {
        let columns = schema.describe();
        Self {
            name: name.into(),
            version,
            schema: Arc::new(schema),
            columns,
        }
    }

    /// Compiles a descriptor at its declared version.
    pub fn compile(descriptor: &ModelDescriptor, compiler: &SchemaCompiler) -> Self {
        let schema = compiler.compile(descriptor.columns.clone(), descriptor.extra_options);
        Self::new(&descriptor.name, descriptor.version, schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Augmented column map, including injected timestamps.
    pub fn columns(&self) -> &BTreeMap<String, ColumnDescription> {
        &self.columns
    }

    pub fn requires(&self, column: &str) -> bool {
        self.schema.requires(column)
    }

    /// Validates and stores a record, returning its public view.
    ///
    /// A record whose `_id` is absent or not yet stored is new. Updates are
    /// merged over the stored document, so omitted fields keep their values.
    pub async fn save(&self, store: &dyn DocumentStore, record: Value) -> ModelResult<Value> {
        let incoming = match record {
            Value::Object(map) => map,
            other => {
                let actual = json_type_name(&other);
                return Err(SchemaError::not_an_object(&self.name, self.version, actual).into());
            }
        };

        let id = match incoming.get(ID_FIELD) {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(other) => {
                return Err(ModelError::InvalidId {
                    table: self.name.clone(),
                    reason: format!("expected a non-empty string, got {}", json_type_name(other)),
                })
            }
        };

        let existing = match store.get(&self.name, &id).await? {
            Some(Value::Object(doc)) => Some(doc),
            Some(_) => {
                return Err(StoreError::NotAnObject {
                    collection: self.name.clone(),
                    id,
                }
                .into())
            }
            None => None,
        };
        let is_new = existing.is_none();

        let revision = existing
            .as_ref()
            .and_then(|doc| doc.get(REVISION_FIELD))
            .and_then(Value::as_u64)
            .map_or(0, |v| v + 1);

        let mut document = existing.unwrap_or_default();
        for (key, value) in incoming {
            document.insert(key, value);
        }

        let now = Utc::now();
        if is_new {
            self.schema.apply_defaults(&mut document, now);
        }
        self.schema.pre_save(&mut document, is_new, now);
        self.schema.strip_undeclared(&mut document);
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        document.insert(REVISION_FIELD.to_string(), Value::from(revision));

        let document = Value::Object(document);
        if let Err(e) = self.schema.validate(&self.name, self.version, &document) {
            log_event_with_fields(
                Event::RecordRejected,
                &[
                    ("table", self.name.as_str()),
                    ("id", id.as_str()),
                    ("reason", e.message()),
                ],
            );
            return Err(e.into());
        }

        store.put(&self.name, &id, document.clone()).await?;

        let revision = revision.to_string();
        log_event_with_fields(
            Event::RecordSaved,
            &[
                ("table", self.name.as_str()),
                ("id", id.as_str()),
                ("revision", revision.as_str()),
            ],
        );

        Ok(self.public(&document))
    }

    /// Public view of one stored record.
    pub async fn find_by_id(&self, store: &dyn DocumentStore, id: &str) -> ModelResult<Option<Value>> {
        Ok(store
            .get(&self.name, id)
            .await?
            .map(|doc| self.public(&doc)))
    }

    /// Public views of every stored record, ordered by id.
    pub async fn all(&self, store: &dyn DocumentStore) -> ModelResult<Vec<Value>> {
        Ok(store
            .list(&self.name)
            .await?
            .iter()
            .map(|(_, doc)| self.public(doc))
            .collect())
    }

    fn public(&self, document: &Value) -> Value {
        match document {
            Value::Object(map) => self.schema.public_view(map),
            other => other.clone(),
        }
    }
}
