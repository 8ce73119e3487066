//! Record validator
//!
//! Validation semantics:
//! - All required columns are present and non-null
//! - Present values match their column type
//! - Mixed and unknown columns accept any value
//! - Undeclared fields are not checked here; the save path strips them
//!
//! The validator never mutates the record and is deterministic.

use serde_json::{Map, Value};

use chrono::DateTime;

use super::compiler::CompiledSchema;
use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::ColumnType;

/// Checks one record against a compiled schema.
pub struct RecordValidator<'a> {
    table: &'a str,
    version: u32,
    schema: &'a CompiledSchema,
}

impl<'a> RecordValidator<'a> {
    pub fn new(table: &'a str, version: u32, schema: &'a CompiledSchema) -> Self {
        Self {
            table,
            version,
            schema,
        }
    }

    /// Validates a full record.
    ///
    /// # Errors
    ///
    /// - `MG_SCHEMA_NOT_AN_OBJECT` if the record is not a JSON object
    /// - `MG_SCHEMA_VALIDATION_FAILED` on the first violated column, in
    ///   column-name order
    pub fn validate(&self, record: &Value) -> SchemaResult<()> {
        let obj = record.as_object().ok_or_else(|| {
            SchemaError::not_an_object(self.table, self.version, json_type_name(record))
        })?;

        self.validate_columns(obj)
    }

    fn validate_columns(&self, obj: &Map<String, Value>) -> SchemaResult<()> {
        for (name, spec) in self.schema.columns() {
            match obj.get(name) {
                None => {
                    if spec.required {
                        return Err(self.fail(ValidationDetails::missing_field(name)));
                    }
                }
                Some(Value::Null) => {
                    if spec.required {
                        return Err(self.fail(ValidationDetails::null_value(name)));
                    }
                }
                Some(value) if spec.column_type.is_checked() => {
                    self.validate_value(name, &spec.column_type, value)?
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    fn validate_value(&self, name: &str, column_type: &ColumnType, value: &Value) -> SchemaResult<()> {
        let ok = match column_type {
            ColumnType::String => value.is_string(),
            ColumnType::Number => value.is_number(),
            ColumnType::Boolean => value.is_boolean(),
            ColumnType::Date => is_date(value),
            ColumnType::ObjectId => value.as_str().is_some_and(|s| !s.is_empty()),
            ColumnType::Mixed | ColumnType::Unknown(_) => true,
        };

        if ok {
            Ok(())
        } else {
            Err(self.fail(ValidationDetails::type_mismatch(
                name,
                column_type.display_name(),
                json_type_name(value),
            )))
        }
    }

    fn fail(&self, details: ValidationDetails) -> SchemaError {
        SchemaError::validation_failed(self.table, self.version, details)
    }
}

/// Dates are RFC 3339 strings or integer epoch milliseconds.
fn is_date(value: &Value) -> bool {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compiler::SchemaCompiler;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types::{ColumnSpec, ExtraOptions};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema() -> CompiledSchema {
        let mut columns = BTreeMap::new();
        columns.insert("lat".to_string(), ColumnSpec::new(ColumnType::Number, true));
        columns.insert("name".to_string(), ColumnSpec::new(ColumnType::String, false));
        columns.insert("visible".to_string(), ColumnSpec::new(ColumnType::Boolean, false));
        columns.insert("owner".to_string(), ColumnSpec::new(ColumnType::ObjectId, false));
        columns.insert("meta".to_string(), ColumnSpec::new(ColumnType::Mixed, false));
        columns.insert("seen".to_string(), ColumnSpec::new(ColumnType::Date, false));
        columns.insert(
            "tags".to_string(),
            ColumnSpec::new(ColumnType::Unknown("[\"String\"]".into()), false),
        );
        let options = ExtraOptions {
            created_at: false,
            updated_at: false,
        };
        SchemaCompiler::default().compile(columns, options)
    }

    fn validate(record: Value) -> SchemaResult<()> {
        let schema = schema();
        RecordValidator::new("points", 1, &schema).validate(&record)
    }

    #[test]
    fn test_valid_record() {
        assert!(validate(json!({"lat": 4.5, "name": "pier", "meta": [1, "x"], "tags": []})).is_ok());
    }

    #[test]
    fn test_missing_required_column() {
        let err = validate(json!({"name": "pier"})).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::ValidationFailed);
        assert_eq!(err.details().unwrap(), &ValidationDetails::missing_field("lat"));
    }

    #[test]
    fn test_null_required_column() {
        let err = validate(json!({"lat": null})).unwrap_err();
        assert_eq!(err.details().unwrap().actual, "null");
    }

    #[test]
    fn test_null_optional_column_allowed() {
        assert!(validate(json!({"lat": 1, "name": null})).is_ok());
    }

    #[test]
    fn test_type_mismatch() {
        let err = validate(json!({"lat": "north"})).unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.field, "lat");
        assert_eq!(details.expected, "Number");
        assert_eq!(details.actual, "string");
    }

    #[test]
    fn test_dates() {
        assert!(validate(json!({"lat": 1, "seen": "2024-03-01T12:00:00.000Z"})).is_ok());
        assert!(validate(json!({"lat": 1, "seen": 1709294400000u64})).is_ok());
        assert!(validate(json!({"lat": 1, "seen": "yesterday"})).is_err());
        assert!(validate(json!({"lat": 1, "seen": 1.5})).is_err());
    }

    #[test]
    fn test_object_id_and_boolean() {
        assert!(validate(json!({"lat": 1, "owner": "u1", "visible": true})).is_ok());
        assert!(validate(json!({"lat": 1, "owner": ""})).is_err());
        assert!(validate(json!({"lat": 1, "visible": "true"})).is_err());
    }

    #[test]
    fn test_unchecked_columns_accept_any_value() {
        for value in [json!(7), json!("x"), json!({"nested": [true]}), json!(false)] {
            assert!(validate(json!({"lat": 1, "meta": value.clone(), "tags": value})).is_ok());
        }
    }

    #[test]
    fn test_non_object_record() {
        let err = validate(json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::NotAnObject);
    }

    #[test]
    fn test_validation_is_deterministic() {
        for _ in 0..50 {
            let err = validate(json!({"lat": "x", "visible": 3})).unwrap_err();
            assert_eq!(err.details().unwrap().field, "lat");
        }
    }
}
