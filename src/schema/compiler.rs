//! Schema compiler
//!
//! Turns a descriptor's column map and options into a [`CompiledSchema`]:
//! the augmented column set plus the record hooks run on every save.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::errors::SchemaResult;
use super::types::{timestamp_value, ColumnDescription, ColumnSpec, ExtraOptions, TimestampMode};
use super::validator::RecordValidator;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
/// Document id field, always allowed
pub const ID_FIELD: &str = "_id";
/// Revision counter, internal
pub const REVISION_FIELD: &str = "__v";

/// Prefix of fields that are stored but never exposed.
const INTERNAL_PREFIX: &str = "__";

/// Compiles column maps into enforceable schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompiler {
    mode: TimestampMode,
}

impl SchemaCompiler {
    pub fn new(mode: TimestampMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    /// Compiles `columns`, injecting timestamp columns per `options`.
    ///
    /// `createdAt` is added unless disabled or already declared. In legacy
    /// mode `updatedAt` is only redefined when the descriptor declares it;
    /// symmetric mode injects it like `createdAt`.
    pub fn compile(
        &self,
        mut columns: BTreeMap<String, ColumnSpec>,
        options: ExtraOptions,
    ) -> CompiledSchema {
        if options.created_at && !columns.contains_key(CREATED_AT) {
            columns.insert(CREATED_AT.to_string(), ColumnSpec::timestamp());
        }

        if options.updated_at {
            let declared = columns.contains_key(UPDATED_AT);
            if declared || self.mode == TimestampMode::Symmetric {
                columns.insert(UPDATED_AT.to_string(), ColumnSpec::timestamp());
            }
        }

        CompiledSchema { columns, options }
    }
}

/// Runtime schema for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    columns: BTreeMap<String, ColumnSpec>,
    options: ExtraOptions,
}

impl CompiledSchema {
    /// Augmented column set.
    pub fn columns(&self) -> &BTreeMap<String, ColumnSpec> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.get(name)
    }

    pub fn options(&self) -> ExtraOptions {
        self.options
    }

    /// Whether a save is rejected when `name` is absent.
    pub fn requires(&self, name: &str) -> bool {
        self.columns.get(name).is_some_and(|c| c.required)
    }

    /// Column map with type tags rendered as display strings.
    pub fn describe(&self) -> BTreeMap<String, ColumnDescription> {
        self.columns
            .iter()
            .map(|(name, spec)| (name.clone(), spec.describe()))
            .collect()
    }

    /// Fills absent columns of a new record from their defaults. An explicit
    /// `null` is kept.
    pub fn apply_defaults(&self, record: &mut Map<String, Value>, now: DateTime<Utc>) {
        for (name, spec) in &self.columns {
            let Some(default) = &spec.default else {
                continue;
            };
            if !record.contains_key(name) {
                record.insert(name.clone(), default.resolve(now));
            }
        }
    }

    /// Timestamp hook run on every save.
    pub fn pre_save(&self, record: &mut Map<String, Value>, is_new: bool, now: DateTime<Utc>) {
        if is_new
            && self.options.created_at
            && record.get(CREATED_AT).map_or(true, Value::is_null)
        {
            record.insert(CREATED_AT.to_string(), timestamp_value(now));
        }

        if self.options.updated_at && self.columns.contains_key(UPDATED_AT) {
            record.insert(UPDATED_AT.to_string(), timestamp_value(now));
        }
    }

    /// Drops fields that are neither declared columns nor reserved.
    pub fn strip_undeclared(&self, record: &mut Map<String, Value>) {
        record.retain(|key, _| {
            key == ID_FIELD || key == REVISION_FIELD || self.columns.contains_key(key)
        });
    }

    /// Checks required-ness and types.
    pub fn validate(&self, table: &str, version: u32, record: &Value) -> SchemaResult<()> {
        RecordValidator::new(table, version, self).validate(record)
    }

    /// Serializable view of a stored record without internal fields.
    pub fn public_view(&self, record: &Map<String, Value>) -> Value {
        Value::Object(
            record
                .iter()
                .filter(|(key, _)| !key.starts_with(INTERNAL_PREFIX))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDefault, ColumnType};
    use chrono::TimeZone;
    use serde_json::json;

    fn columns() -> BTreeMap<String, ColumnSpec> {
        let mut columns = BTreeMap::new();
        columns.insert("lat".to_string(), ColumnSpec::new(ColumnType::Number, true));
        columns.insert("name".to_string(), ColumnSpec::new(ColumnType::String, false));
        columns
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_created_at_injected_by_default() {
        let schema = SchemaCompiler::default().compile(columns(), ExtraOptions::default());
        assert_eq!(schema.column(CREATED_AT), Some(&ColumnSpec::timestamp()));
        assert!(schema.requires(CREATED_AT));
    }

    #[test]
    fn test_created_at_disabled() {
        let options = ExtraOptions {
            created_at: false,
            updated_at: true,
        };
        let schema = SchemaCompiler::default().compile(columns(), options);
        assert!(schema.column(CREATED_AT).is_none());
    }

    #[test]
    fn test_declared_created_at_kept() {
        let mut cols = columns();
        let own = ColumnSpec::new(ColumnType::Date, false);
        cols.insert(CREATED_AT.to_string(), own.clone());

        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());
        assert_eq!(schema.column(CREATED_AT), Some(&own));
    }

    #[test]
    fn test_legacy_updated_at_only_when_declared() {
        let schema = SchemaCompiler::default().compile(columns(), ExtraOptions::default());
        assert!(schema.column(UPDATED_AT).is_none());

        let mut cols = columns();
        cols.insert(UPDATED_AT.to_string(), ColumnSpec::new(ColumnType::Date, false));
        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());
        assert_eq!(schema.column(UPDATED_AT), Some(&ColumnSpec::timestamp()));
    }

    #[test]
    fn test_symmetric_updated_at_injected() {
        let schema = SchemaCompiler::new(TimestampMode::Symmetric)
            .compile(columns(), ExtraOptions::default());
        assert_eq!(schema.column(UPDATED_AT), Some(&ColumnSpec::timestamp()));

        let options = ExtraOptions {
            created_at: true,
            updated_at: false,
        };
        let schema = SchemaCompiler::new(TimestampMode::Symmetric).compile(columns(), options);
        assert!(schema.column(UPDATED_AT).is_none());
    }

    #[test]
    fn test_unknown_type_survives_compilation() {
        let mut cols = columns();
        cols.insert(
            "blob".to_string(),
            ColumnSpec::new(ColumnType::parse("Buffer"), false),
        );
        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());
        assert_eq!(schema.describe()["blob"].column_type, "Unknown");
    }

    #[test]
    fn test_pre_save_stamps_new_records_only() {
        let schema = SchemaCompiler::default().compile(columns(), ExtraOptions::default());
        let now = fixed_now();

        let mut record = Map::new();
        schema.pre_save(&mut record, true, now);
        assert_eq!(record[CREATED_AT], json!("2024-03-01T12:00:00.000Z"));

        let mut existing = Map::new();
        schema.pre_save(&mut existing, false, now);
        assert!(!existing.contains_key(CREATED_AT));
    }

    #[test]
    fn test_pre_save_keeps_given_created_at() {
        let schema = SchemaCompiler::default().compile(columns(), ExtraOptions::default());
        let mut record = Map::new();
        record.insert(CREATED_AT.to_string(), json!("2020-01-01T00:00:00.000Z"));

        schema.pre_save(&mut record, true, fixed_now());
        assert_eq!(record[CREATED_AT], json!("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_pre_save_updated_at_every_save() {
        let mut cols = columns();
        cols.insert(UPDATED_AT.to_string(), ColumnSpec::new(ColumnType::Date, false));
        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());

        let mut record = Map::new();
        schema.pre_save(&mut record, false, fixed_now());
        assert_eq!(record[UPDATED_AT], json!("2024-03-01T12:00:00.000Z"));
    }

    #[test]
    fn test_defaults_and_strict_filtering() {
        let mut cols = columns();
        cols.insert(
            "kind".to_string(),
            ColumnSpec::new(ColumnType::String, false)
                .with_default(ColumnDefault::Value(json!("poi"))),
        );
        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());

        let mut record = json!({"lat": 1.5, "extra": true, "_id": "a", "__v": 0})
            .as_object()
            .cloned()
            .unwrap();
        schema.apply_defaults(&mut record, fixed_now());
        schema.strip_undeclared(&mut record);

        assert_eq!(record["kind"], json!("poi"));
        assert!(record.contains_key(CREATED_AT));
        assert!(!record.contains_key("extra"));
        assert!(record.contains_key("_id"));

        let view = schema.public_view(&record);
        assert!(view.get("__v").is_none());
        assert_eq!(view["_id"], json!("a"));
    }

    #[test]
    fn test_explicit_null_not_defaulted() {
        let mut cols = columns();
        cols.insert(
            "kind".to_string(),
            ColumnSpec::new(ColumnType::String, false)
                .with_default(ColumnDefault::Value(json!("poi"))),
        );
        let schema = SchemaCompiler::default().compile(cols, ExtraOptions::default());

        let mut record = json!({"lat": 1.5, "kind": null}).as_object().cloned().unwrap();
        schema.apply_defaults(&mut record, fixed_now());

        assert_eq!(record.get("kind"), Some(&Value::Null));
    }
}
