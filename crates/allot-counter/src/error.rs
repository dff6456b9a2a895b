//! Assignment errors.

use thiserror::Error;

/// Result type alias for identifier assignment.
pub type AssignResult<T> = Result<T, AssignError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// Every identifier up to `i64::MAX` is taken (reuse) or was already
    /// handed out (no reuse).
    #[error("identifiers exhausted at i64::MAX while assigning key {key:?}")]
    Exhausted { key: String },
}
