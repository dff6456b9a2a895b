//! Reconciler error types.

use thiserror::Error;

/// Errors that can occur while reconciling a resource.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] anyhow::Error),

    #[error(transparent)]
    Capacity(#[from] allot_buckets::PackError),

    #[error(transparent)]
    Identifiers(#[from] allot_counter::AssignError),

    #[error("state store error: {0}")]
    State(#[from] allot_state::StateError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Whether the allocator itself rejected the resource. Such failures
    /// are reported per resource instead of aborting the run.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            ReconcileError::Capacity(_) | ReconcileError::Identifiers(_)
        )
    }
}
