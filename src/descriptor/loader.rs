//! Descriptor loader
//!
//! Turns raw descriptor sources into validated [`ModelDescriptor`] values.
//! Loading is pure: it never touches the document store, so a bad descriptor
//! set is rejected before any registry write.
//!
//! - Table names come from the source identifier, cut at the first `.` and
//!   reduced to `[A-Za-z0-9_-]`
//! - `version` must be an integer after numeric coercion and at least 1
//! - `columns` must be a non-empty object
//! - Two sources with the same table name are rejected

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::types::{DescriptorSource, ModelDescriptor};
use crate::reconcile::{ReconcileError, ReconcileResult};
use crate::schema::{ColumnSpec, ExtraOptions};

/// File suffix of descriptor files.
pub const DEFAULT_SUFFIX: &str = ".table.json";

fn disallowed_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("table name pattern is valid"))
}

/// Derives a table name from a source identifier.
///
/// Returns `None` when nothing survives sanitizing.
pub fn table_name(identifier: &str) -> Option<String> {
    let file_name = Path::new(identifier)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(identifier);

    let stem = file_name.split('.').next().unwrap_or_default();
    let name = disallowed_chars().replace_all(stem, "").into_owned();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Coerces a descriptor `version` to a positive integer.
///
/// Accepts JSON integers, integral floats and numeric strings.
pub fn coerce_version(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("version {} is not a number", n))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("version '{}' is not numeric", s))?,
        other => return Err(format!("version must be an integer, got {}", other)),
    };

    if !number.is_finite() || number.fract() != 0.0 {
        return Err(format!("version {} is not an integer", number));
    }
    if number < 1.0 || number > f64::from(u32::MAX) {
        return Err(format!("version {} is out of range", number));
    }

    Ok(number as u32)
}

impl ModelDescriptor {
    /// Validates one source into a descriptor.
    pub fn from_source(source: DescriptorSource) -> ReconcileResult<Self> {
        let DescriptorSource {
            identifier,
            body,
            upgrade,
        } = source;

        let name = table_name(&identifier).ok_or_else(|| {
            ReconcileError::invalid_source(&identifier, "no usable table name in identifier")
        })?;
        let invalid = |reason: String| ReconcileError::invalid_descriptor(&name, &identifier, reason);

        let obj = body
            .as_object()
            .ok_or_else(|| invalid("descriptor body must be an object".into()))?;

        let version = match obj.get("version") {
            None | Some(Value::Null) => return Err(invalid("missing version number".into())),
            Some(v) => coerce_version(v).map_err(&invalid)?,
        };

        let raw_columns = match obj.get("columns") {
            Some(Value::Object(columns)) if !columns.is_empty() => columns,
            Some(Value::Object(_)) => return Err(invalid("columns must not be empty".into())),
            Some(_) => return Err(invalid("columns must be an object".into())),
            None => return Err(invalid("missing columns".into())),
        };

        let columns: BTreeMap<String, ColumnSpec> = raw_columns
            .iter()
            .map(|(column, spec)| (column.clone(), ColumnSpec::from_descriptor(spec)))
            .collect();

        let extra_options = ExtraOptions::from_descriptor(obj.get("extraOptions")).map_err(&invalid)?;

        Ok(Self {
            name,
            source_id: identifier,
            version,
            columns,
            extra_options,
            upgrade,
        })
    }
}

/// Accumulates validated descriptors keyed by table name.
#[derive(Debug, Default)]
pub struct DescriptorLoader {
    descriptors: BTreeMap<String, ModelDescriptor>,
}

impl DescriptorLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds one source.
    ///
    /// # Errors
    ///
    /// - `MG_INVALID_DESCRIPTOR` if the source is malformed
    /// - `MG_DUPLICATE_DESCRIPTOR` if its table name is already registered
    pub fn register(&mut self, source: DescriptorSource) -> ReconcileResult<&ModelDescriptor> {
        let descriptor = ModelDescriptor::from_source(source)?;

        if let Some(existing) = self.descriptors.get(&descriptor.name) {
            return Err(ReconcileError::duplicate_descriptor(
                &descriptor.name,
                &existing.source_id,
                &descriptor.source_id,
            ));
        }

        debug!(
            table = %descriptor.name,
            version = descriptor.version,
            source = %descriptor.source_id,
            "descriptor loaded"
        );

        let name = descriptor.name.clone();
        Ok(self.descriptors.entry(name).or_insert(descriptor))
    }

    pub fn into_descriptors(self) -> BTreeMap<String, ModelDescriptor> {
        self.descriptors
    }
}

/// Validates a whole feed of sources.
pub fn load_descriptors(
    sources: impl IntoIterator<Item = DescriptorSource>,
) -> ReconcileResult<BTreeMap<String, ModelDescriptor>> {
    let mut loader = DescriptorLoader::new();
    for source in sources {
        loader.register(source)?;
    }
    Ok(loader.into_descriptors())
}

/// Reads descriptor files from a directory, in file-name order.
///
/// Unreadable or unparseable files, and a missing directory, are
/// `MG_INVALID_DESCRIPTOR`.
pub fn read_dir(dir: &Path, suffix: &str) -> ReconcileResult<Vec<DescriptorSource>> {
    let dir_id = dir.display().to_string();

    let entries = fs::read_dir(dir).map_err(|e| {
        ReconcileError::invalid_source(&dir_id, format!("cannot read descriptor directory: {}", e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            ReconcileError::invalid_source(&dir_id, format!("cannot read directory entry: {}", e))
        })?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| -> ReconcileResult<DescriptorSource> {
            let identifier = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let content = fs::read_to_string(&path).map_err(|e| {
                ReconcileError::invalid_source(&identifier, format!("cannot read file: {}", e))
            })?;
            let body: Value = serde_json::from_str(&content).map_err(|e| {
                ReconcileError::invalid_source(&identifier, format!("invalid JSON: {}", e))
            })?;
            Ok(DescriptorSource::new(identifier, body))
        })
        .collect()
}
