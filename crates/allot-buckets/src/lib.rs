//! allot-buckets — capacity-bounded bin-packing with minimal disruption.
//!
//! Places weighted items into a fixed number of ordered, capacity-limited
//! buckets. Placement is first-fit in ascending bucket order, and items
//! that were already placed only move when their own weight grows past
//! what their bucket can hold.
//!
//! # Components
//!
//! - **`packer`** — The four-phase reconciliation (resize, evict, place, emit)
//! - **`error`** — `PackError::CapacityExhausted`
//!
//! Packing is all-or-nothing: the work happens on a scratch copy of the
//! prior buckets and is only returned once every item has a home.

pub mod error;
pub mod packer;

pub use error::{PackError, PackResult};
pub use packer::{PackPolicy, pack};
