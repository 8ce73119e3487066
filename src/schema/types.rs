//! Column type definitions
//!
//! Supported column types:
//! - String: UTF-8 string
//! - Number: any JSON number
//! - Date: RFC 3339 timestamp string or epoch milliseconds
//! - Boolean
//! - ObjectId: reference to another document by id
//! - Mixed: opaque value, never type-checked
//!
//! Unrecognized type tags are carried as `Unknown` and are not type-checked
//! either.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Literal used in descriptors for the "current time" default.
pub const NOW_DEFAULT: &str = "$now";

/// Semantic type tag of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
    ObjectId,
    Mixed,
    /// Tag that did not match any known type; the original tag is kept
    Unknown(String),
}

impl ColumnType {
    /// Parses a descriptor type tag. Never fails.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "String" => ColumnType::String,
            "Number" => ColumnType::Number,
            "Date" => ColumnType::Date,
            "Boolean" => ColumnType::Boolean,
            "ObjectId" | "ObjectReference" => ColumnType::ObjectId,
            "Mixed" | "Opaque" => ColumnType::Mixed,
            other => ColumnType::Unknown(other.to_string()),
        }
    }

    /// Display string used in descriptive column maps.
    pub fn display_name(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Number => "Number",
            ColumnType::Date => "Date",
            ColumnType::Boolean => "Boolean",
            ColumnType::ObjectId => "ObjectId",
            ColumnType::Mixed => "Mixed",
            ColumnType::Unknown(_) => "Unknown",
        }
    }

    /// Whether values of this column are type-checked on save.
    pub fn is_checked(&self) -> bool {
        !matches!(self, ColumnType::Mixed | ColumnType::Unknown(_))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Default applied to a column when a new record omits it.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// Fixed JSON value
    Value(Value),
    /// Current time at record creation
    Now,
}

impl ColumnDefault {
    /// Parses a descriptor `default` entry.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if s == NOW_DEFAULT => ColumnDefault::Now,
            other => ColumnDefault::Value(other.clone()),
        }
    }

    /// Produces the concrete value for a record being created at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Value {
        match self {
            ColumnDefault::Value(v) => v.clone(),
            ColumnDefault::Now => timestamp_value(now),
        }
    }

    /// Form shown in descriptive output.
    pub fn describe(&self) -> Value {
        match self {
            ColumnDefault::Value(v) => v.clone(),
            ColumnDefault::Now => Value::String(NOW_DEFAULT.to_string()),
        }
    }
}

/// Renders a timestamp the way Date columns store it.
pub fn timestamp_value(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Shape of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub column_type: ColumnType,
    pub required: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnSpec {
    pub fn new(column_type: ColumnType, required: bool) -> Self {
        Self {
            column_type,
            required,
            default: None,
        }
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Required Date column stamped with the creation time.
    pub fn timestamp() -> Self {
        Self::new(ColumnType::Date, true).with_default(ColumnDefault::Now)
    }

    /// Parses a descriptor column entry such as
    /// `{"type": "Number", "required": true, "default": 0}`.
    ///
    /// Never fails. A bare string is taken as the type tag. A missing or
    /// non-string `type`, or an entry that is not an object at all, becomes
    /// [`ColumnType::Unknown`] and is not type-checked. `required` is only
    /// set by a literal `true`.
    pub fn from_descriptor(value: &Value) -> Self {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::String(tag) => return Self::new(ColumnType::parse(tag), false),
            other => return Self::new(ColumnType::Unknown(other.to_string()), false),
        };

        let column_type = match obj.get("type") {
            Some(Value::String(tag)) => ColumnType::parse(tag),
            Some(other) => ColumnType::Unknown(other.to_string()),
            None => ColumnType::Unknown(String::new()),
        };

        Self {
            column_type,
            required: matches!(obj.get("required"), Some(Value::Bool(true))),
            default: obj.get("default").map(ColumnDefault::from_value),
        }
    }

    pub fn describe(&self) -> ColumnDescription {
        ColumnDescription {
            column_type: self.column_type.display_name().to_string(),
            required: self.required,
            default: self.default.as_ref().map(ColumnDefault::describe),
        }
    }
}

/// Introspection view of a column with its type normalized to a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    #[serde(rename = "type")]
    pub column_type: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Per-table toggles for automatic timestamp columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraOptions {
    #[serde(default = "default_true")]
    pub created_at: bool,
    #[serde(default = "default_true")]
    pub updated_at: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExtraOptions {
    fn default() -> Self {
        Self {
            created_at: true,
            updated_at: true,
        }
    }
}

impl ExtraOptions {
    /// Parses the optional `extraOptions` object of a descriptor.
    pub fn from_descriptor(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(obj)) => {
                Ok(Self {
                    created_at: option_flag(obj, "createdAt")?,
                    updated_at: option_flag(obj, "updatedAt")?,
                })
            }
            Some(_) => Err("'extraOptions' must be an object".into()),
        }
    }
}

fn option_flag(obj: &Map<String, Value>, key: &str) -> Result<bool, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(format!("extraOptions.{} must be a boolean", key)),
    }
}

/// How the `updatedAt` column is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// `updatedAt` is only managed when the descriptor declares it.
    /// Matches schemas persisted by earlier releases.
    #[default]
    Legacy,
    /// `updatedAt` is injected like `createdAt`.
    Symmetric,
}
