//! Lifecycle events
//!
//! Events are explicit and typed. Each one is rendered as the `event` field
//! of a tracing record so log consumers can filter on a stable name.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Data directory layout created
    DataDirInitialized,

    // Reconciliation pass
    /// Pass started
    ReconcileStart,
    /// Version registry read
    VersionsLoaded,
    /// Descriptor set validated
    DescriptorsLoaded,
    /// Persisted version matches the descriptor
    TableUnchanged,
    /// Table has no persisted version yet
    TableNew,
    /// Persisted version differs from the descriptor (FATAL)
    TableVersionMismatch,
    /// Persisted version has no descriptor (FATAL)
    TableOrphaned,
    /// Compiled model ready
    TableMaterialized,
    /// Pass finished with a model registry
    ReconcileComplete,
    /// Pass aborted (FATAL)
    ReconcileFailed,

    // Records
    /// Record written through a compiled model
    RecordSaved,
    /// Record rejected by its schema
    RecordRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DataDirInitialized => "DATA_DIR_INITIALIZED",

            Event::ReconcileStart => "RECONCILE_BEGIN",
            Event::VersionsLoaded => "VERSIONS_LOADED",
            Event::DescriptorsLoaded => "DESCRIPTORS_LOADED",
            Event::TableUnchanged => "TABLE_UNCHANGED",
            Event::TableNew => "TABLE_NEW",
            Event::TableVersionMismatch => "TABLE_VERSION_MISMATCH",
            Event::TableOrphaned => "TABLE_ORPHANED",
            Event::TableMaterialized => "TABLE_MATERIALIZED",
            Event::ReconcileComplete => "RECONCILE_COMPLETE",
            Event::ReconcileFailed => "RECONCILE_FAILED",

            Event::RecordSaved => "RECORD_SAVED",
            Event::RecordRejected => "RECORD_REJECTED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Event::TableVersionMismatch | Event::TableOrphaned | Event::ReconcileFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::DataDirInitialized,
            Event::ReconcileStart,
            Event::VersionsLoaded,
            Event::DescriptorsLoaded,
            Event::TableUnchanged,
            Event::TableNew,
            Event::TableVersionMismatch,
            Event::TableOrphaned,
            Event::TableMaterialized,
            Event::ReconcileComplete,
            Event::ReconcileFailed,
            Event::RecordSaved,
            Event::RecordRejected,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::TableOrphaned.is_fatal());
        assert!(Event::ReconcileFailed.is_fatal());
        assert!(!Event::TableNew.is_fatal());
        assert!(!Event::RecordRejected.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::ReconcileStart), "RECONCILE_BEGIN");
        assert_eq!(format!("{}", Event::TableMaterialized), "TABLE_MATERIALIZED");
    }
}
