//! allot-state — persisted resource state for allot.
//!
//! Backed by [redb](https://docs.rs/redb). Each managed resource is one
//! JSON-serialized record keyed by its name; writing a record is a single
//! write transaction, so a reconciliation either publishes a complete new
//! snapshot or leaves the previous one in place.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
