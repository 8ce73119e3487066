//! Record operation errors

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Errors from saving or reading records through a compiled model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Record rejected by the compiled schema
    #[error(transparent)]
    Validation(#[from] SchemaError),

    /// Document store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `_id` present but not a non-empty string
    #[error("Invalid _id for table '{table}': {reason}")]
    InvalidId { table: String, reason: String },
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Validation(e) => e.code().code(),
            ModelError::Store(_) => "MG_MODEL_STORE_FAILED",
            ModelError::InvalidId { .. } => "MG_MODEL_INVALID_ID",
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
