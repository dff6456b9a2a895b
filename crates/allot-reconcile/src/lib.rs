//! allot-reconcile — resource lifecycle for allot.
//!
//! Drives the allocators from declared configuration and persisted
//! records. For every declared resource the reconciler:
//!
//! - Creates it when no record exists yet
//! - Updates it incrementally from the stored allocation
//! - Replaces it from scratch when a bucket set changes capacity or count
//! - Deletes records whose resource is no longer declared
//!
//! A resource whose allocation fails keeps its previous record; the
//! failure is reported and the other resources still reconcile.
//!
//! # Architecture
//!
//! ```text
//! Reconciler
//!   ├── AllotConfig (desired state)
//!   ├── StateStore (prior records in, new records out)
//!   ├── allot-counter (identifier assignment)
//!   └── allot-buckets (capacity packing)
//! ```

pub mod error;
pub mod reconciler;
pub mod report;

pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::Reconciler;
pub use report::{Outcome, ReconcileReport, ResourceReport, format_report, format_snapshot};
