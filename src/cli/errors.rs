//! CLI-specific error types
//!
//! All CLI errors end the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::model::ModelError;
use crate::reconcile::{ReconcileError, ReconcileErrorCode};
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Store or runtime could not be started
    BootFailed,
    /// `insert` named a table the pass did not produce
    UnknownTable,
    /// Reconciliation pass failed
    Reconcile(ReconcileErrorCode),
    /// Record rejected or not stored
    Record(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MG_CLI_CONFIG_ERROR",
            Self::IoError => "MG_CLI_IO_ERROR",
            Self::AlreadyInitialized => "MG_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "MG_CLI_NOT_INITIALIZED",
            Self::BootFailed => "MG_CLI_BOOT_FAILED",
            Self::UnknownTable => "MG_CLI_UNKNOWN_TABLE",
            Self::Reconcile(code) => code.code(),
            Self::Record(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'modelgate init' first.",
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn unknown_table(table: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownTable,
            format!("No descriptor defines table '{}'", table),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        Self::new(CliErrorCode::Reconcile(e.code()), e.to_string())
    }
}

impl From<ModelError> for CliError {
    fn from(e: ModelError) -> Self {
        Self::new(CliErrorCode::Record(e.code()), e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::boot_failed(format!("Failed to open store: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_code_passes_through() {
        let err: CliError = ReconcileError::orphaned_table("legacy", 1).into();
        assert_eq!(err.code_str(), "MG_ORPHANED_TABLE");
        assert!(err.message().contains("legacy"));
    }

    #[test]
    fn test_cli_codes() {
        assert_eq!(CliError::unknown_table("x").code_str(), "MG_CLI_UNKNOWN_TABLE");
        assert_eq!(CliError::not_initialized().code(), &CliErrorCode::NotInitialized);
    }
}
