//! allot-counter — stable identifier assignment.
//!
//! Maps a set of string keys to `i64` identifiers. Keys that already
//! hold an identifier keep it; new keys either extend a monotonic
//! watermark or, in reuse mode, fill the smallest free gap.
//!
//! The assigner is a pure function of (desired keys, prior state,
//! policy) and keeps nothing between calls. It fails only when the
//! `i64` range above `initial` runs out.

pub mod assigner;
pub mod error;

pub use assigner::{AssignPolicy, assign_keys, create, update};
pub use error::{AssignError, AssignResult};
