//! allot-core — shared types and configuration for the allot allocators.
//!
//! Holds the persisted state shapes (`IdentifierState`, `PackingState`),
//! the desired-state declarations parsed from `allot.toml`, and the
//! calling-layer validation that runs before any allocator is invoked.

pub mod config;
pub mod types;
pub mod validation;

pub use config::{AllotConfig, BucketsConfig, CounterConfig};
pub use types::*;
pub use validation::validate_config;
