//! Record validation errors
//!
//! Error codes:
//! - MG_SCHEMA_NOT_AN_OBJECT
//! - MG_SCHEMA_VALIDATION_FAILED

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Record is not a JSON object
    NotAnObject,
    /// Record violates a column rule
    ValidationFailed,
}

impl SchemaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::NotAnObject => "MG_SCHEMA_NOT_AN_OBJECT",
            SchemaErrorCode::ValidationFailed => "MG_SCHEMA_VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Column name
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "field to be present".into(),
            actual: "missing".into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "non-null value".into(),
            actual: "null".into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Record validation error with table context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    table: String,
    version: u32,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    pub fn not_an_object(table: impl Into<String>, version: u32, actual: &str) -> Self {
        let table = table.into();
        Self {
            code: SchemaErrorCode::NotAnObject,
            message: format!("Record for '{}' must be an object, got {}", table, actual),
            table,
            version,
            details: None,
        }
    }

    pub fn validation_failed(
        table: impl Into<String>,
        version: u32,
        details: ValidationDetails,
    ) -> Self {
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message: format!("Record validation failed: {}", details),
            table: table.into(),
            version,
            details: Some(details),
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (table: {}, version: {})",
            self.code, self.message, self.table, self.version
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::NotAnObject.code(), "MG_SCHEMA_NOT_AN_OBJECT");
        assert_eq!(
            SchemaErrorCode::ValidationFailed.code(),
            "MG_SCHEMA_VALIDATION_FAILED"
        );
    }

    #[test]
    fn test_validation_details_display() {
        let details = ValidationDetails::type_mismatch("lat", "Number", "string");
        let display = format!("{}", details);
        assert!(display.contains("lat"));
        assert!(display.contains("Number"));
        assert!(display.contains("string"));
    }

    #[test]
    fn test_error_carries_table_context() {
        let err = SchemaError::validation_failed("points", 1, ValidationDetails::missing_field("lat"));
        let display = err.to_string();
        assert!(display.contains("MG_SCHEMA_VALIDATION_FAILED"));
        assert!(display.contains("points"));
        assert!(display.contains("version: 1"));
        assert_eq!(err.details().unwrap().field, "lat");
    }
}
