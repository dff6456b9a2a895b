//! Error types for the allot state store.

use thiserror::Error;

use allot_core::ResourceKind;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
///
/// The redb failures carry the backend's message; record-level failures
/// name the record they concern.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open state: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("failed to encode record {name:?}: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value no longer parses as the record type of its table.
    #[error("corrupt record {name:?} in table {table}: {source}")]
    Corrupt {
        table: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} {name:?} not found in state")]
    NotFound { kind: ResourceKind, name: String },
}

impl StateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound { .. })
    }
}
