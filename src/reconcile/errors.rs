//! Reconciliation error types
//!
//! Error codes:
//! - MG_INVALID_DESCRIPTOR
//! - MG_DUPLICATE_DESCRIPTOR
//! - MG_UNIMPLEMENTED_MIGRATION
//! - MG_ORPHANED_TABLE
//! - MG_REGISTRY_UNAVAILABLE
//! - MG_INTERNAL
//!
//! Every error aborts the whole pass. No registry is produced for any table.

use std::fmt;

use crate::store::StoreError;

/// Reconciliation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileErrorCode {
    /// Missing or malformed version, columns, or options
    InvalidDescriptor,
    /// Two sources map to the same table name
    DuplicateDescriptor,
    /// Persisted version differs from the descriptor version
    UnimplementedMigration,
    /// Persisted metadata has no descriptor
    OrphanedTable,
    /// Version registry could not be read or written
    RegistryUnavailable,
    /// A materialization task panicked or was cancelled
    Internal,
}

impl ReconcileErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReconcileErrorCode::InvalidDescriptor => "MG_INVALID_DESCRIPTOR",
            ReconcileErrorCode::DuplicateDescriptor => "MG_DUPLICATE_DESCRIPTOR",
            ReconcileErrorCode::UnimplementedMigration => "MG_UNIMPLEMENTED_MIGRATION",
            ReconcileErrorCode::OrphanedTable => "MG_ORPHANED_TABLE",
            ReconcileErrorCode::RegistryUnavailable => "MG_REGISTRY_UNAVAILABLE",
            ReconcileErrorCode::Internal => "MG_INTERNAL",
        }
    }
}

impl fmt::Display for ReconcileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Pass-fatal reconciliation error with diagnostic context.
#[derive(Debug)]
pub struct ReconcileError {
    code: ReconcileErrorCode,
    message: String,
    table: Option<String>,
    source_id: Option<String>,
    persisted_version: Option<i64>,
    declared_version: Option<u32>,
    source: Option<StoreError>,
}

impl ReconcileError {
    fn new(code: ReconcileErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            table: None,
            source_id: None,
            persisted_version: None,
            declared_version: None,
            source: None,
        }
    }

    /// Descriptor source rejected before a table name was known.
    pub fn invalid_source(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let source_id = source_id.into();
        let mut err = Self::new(
            ReconcileErrorCode::InvalidDescriptor,
            format!("Invalid descriptor '{}': {}", source_id, reason.into()),
        );
        err.source_id = Some(source_id);
        err
    }

    /// Descriptor for a named table rejected.
    pub fn invalid_descriptor(
        table: impl Into<String>,
        source_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let table = table.into();
        let source_id = source_id.into();
        let mut err = Self::new(
            ReconcileErrorCode::InvalidDescriptor,
            format!(
                "Invalid descriptor for table '{}' ({}): {}",
                table,
                source_id,
                reason.into()
            ),
        );
        err.table = Some(table);
        err.source_id = Some(source_id);
        err
    }

    pub fn duplicate_descriptor(
        table: impl Into<String>,
        first_source: &str,
        second_source: &str,
    ) -> Self {
        let table = table.into();
        let mut err = Self::new(
            ReconcileErrorCode::DuplicateDescriptor,
            format!(
                "Table '{}' is described by both '{}' and '{}'",
                table, first_source, second_source
            ),
        );
        err.table = Some(table);
        err.source_id = Some(second_source.to_string());
        err
    }

    pub fn unimplemented_migration(table: impl Into<String>, persisted: i64, declared: u32) -> Self {
        let table = table.into();
        let mut err = Self::new(
            ReconcileErrorCode::UnimplementedMigration,
            format!(
                "Table '{}' is at version {} but its descriptor declares version {}; migration is not implemented",
                table, persisted, declared
            ),
        );
        err.table = Some(table);
        err.persisted_version = Some(persisted);
        err.declared_version = Some(declared);
        err
    }

    pub fn orphaned_table(table: impl Into<String>, persisted: i64) -> Self {
        let table = table.into();
        let mut err = Self::new(
            ReconcileErrorCode::OrphanedTable,
            format!(
                "Table '{}' (version {}) has persisted metadata but no descriptor",
                table, persisted
            ),
        );
        err.table = Some(table);
        err.persisted_version = Some(persisted);
        err
    }

    /// Store failure during a registry operation.
    pub fn registry_unavailable(operation: &str, table: Option<&str>, source: StoreError) -> Self {
        let mut err = Self::new(
            ReconcileErrorCode::RegistryUnavailable,
            format!("Version registry {} failed: {}", operation, source),
        );
        err.table = table.map(String::from);
        err.source = Some(source);
        err
    }

    /// Persisted registry entry that cannot be interpreted.
    pub fn malformed_registry_record(table: impl Into<String>, reason: impl Into<String>) -> Self {
        let table = table.into();
        let mut err = Self::new(
            ReconcileErrorCode::RegistryUnavailable,
            format!("Version record '{}' is malformed: {}", table, reason.into()),
        );
        err.table = Some(table);
        err
    }

    pub fn internal(table: Option<&str>, reason: impl Into<String>) -> Self {
        let mut err = Self::new(ReconcileErrorCode::Internal, reason.into());
        err.table = table.map(String::from);
        err
    }

    pub fn code(&self) -> ReconcileErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Table the failure is about, when known.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Descriptor source identifier, when the failure came from loading.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn persisted_version(&self) -> Option<i64> {
        self.persisted_version
    }

    pub fn declared_version(&self) -> Option<u32> {
        self.declared_version
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)?;

        let mut context = Vec::new();
        if let Some(table) = &self.table {
            context.push(format!("table: {}", table));
        }
        if let Some(v) = self.persisted_version {
            context.push(format!("persisted_version: {}", v));
        }
        if let Some(v) = self.declared_version {
            context.push(format!("declared_version: {}", v));
        }
        if !context.is_empty() {
            write!(f, " ({})", context.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_codes() {
        assert_eq!(ReconcileErrorCode::InvalidDescriptor.code(), "MG_INVALID_DESCRIPTOR");
        assert_eq!(ReconcileErrorCode::DuplicateDescriptor.code(), "MG_DUPLICATE_DESCRIPTOR");
        assert_eq!(
            ReconcileErrorCode::UnimplementedMigration.code(),
            "MG_UNIMPLEMENTED_MIGRATION"
        );
        assert_eq!(ReconcileErrorCode::OrphanedTable.code(), "MG_ORPHANED_TABLE");
        assert_eq!(
            ReconcileErrorCode::RegistryUnavailable.code(),
            "MG_REGISTRY_UNAVAILABLE"
        );
    }

    #[test]
    fn test_migration_error_names_both_versions() {
        let err = ReconcileError::unimplemented_migration("points", 1, 2);
        let display = err.to_string();
        assert!(display.contains("MG_UNIMPLEMENTED_MIGRATION"));
        assert!(display.contains("table: points"));
        assert!(display.contains("persisted_version: 1"));
        assert!(display.contains("declared_version: 2"));
        assert_eq!(err.persisted_version(), Some(1));
        assert_eq!(err.declared_version(), Some(2));
    }

    #[test]
    fn test_orphan_error_names_table() {
        let err = ReconcileError::orphaned_table("legacy", 1);
        assert_eq!(err.code(), ReconcileErrorCode::OrphanedTable);
        assert_eq!(err.table(), Some("legacy"));
        assert!(err.to_string().contains("legacy"));
    }

    #[test]
    fn test_registry_error_keeps_source() {
        let err = ReconcileError::registry_unavailable(
            "list",
            None,
            StoreError::Unavailable("connection refused".into()),
        );
        assert!(err.source().is_some());
        assert!(err.message().contains("connection refused"));
    }

    #[test]
    fn test_duplicate_names_both_sources() {
        let err = ReconcileError::duplicate_descriptor("points", "points.table.json", "points!.table.json");
        assert!(err.message().contains("points.table.json"));
        assert!(err.message().contains("points!.table.json"));
    }
}
