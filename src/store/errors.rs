//! # Document Store Errors

use std::io;

use thiserror::Error;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached or opened
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Record checksum or framing failure
    #[error("Data corruption at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    /// Disk I/O failure
    #[error("I/O error during {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Document body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document body is not a JSON object
    #[error("Document '{collection}/{id}' is not an object")]
    NotAnObject { collection: String, id: String },
}

impl StoreError {
    /// Wrap an I/O error with the operation that failed
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    /// Corruption detected while scanning the record file
    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether the store should be treated as unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corruption { .. } | StoreError::Unavailable(_))
    }
}
