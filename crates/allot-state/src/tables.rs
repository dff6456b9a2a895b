//! redb table definitions for the allot state store.
//!
//! Each table uses `&str` keys (the resource name) and `&[u8]` values
//! (JSON-serialized records).

use redb::TableDefinition;

/// Counter records keyed by resource name.
pub const COUNTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("counters");

/// Bucket-set records keyed by resource name.
pub const BUCKETS: TableDefinition<&str, &[u8]> = TableDefinition::new("buckets");
