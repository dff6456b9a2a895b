//! Persisted record types.
//!
//! A record pairs the configuration a resource was last reconciled with
//! and the allocator output computed for it. The output is the only input
//! the next reconciliation needs besides the new configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use allot_core::{BucketsConfig, CounterConfig, IdentifierState, Item, Key, PackingState};

// ── Counter ───────────────────────────────────────────────────────

/// Stored state of a counter resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterRecord {
    pub name: String,
    pub keys: Vec<Key>,
    pub initial_value: i64,
    pub reuse: bool,
    /// `last_value` and `values`, inlined.
    #[serde(flatten)]
    pub assignment: IdentifierState,
}

impl CounterRecord {
    pub fn new(config: &CounterConfig, assignment: IdentifierState) -> Self {
        Self {
            name: config.name.clone(),
            keys: config.keys.clone(),
            initial_value: config.initial_value,
            reuse: config.reuse,
            assignment,
        }
    }
}

// ── Buckets ───────────────────────────────────────────────────────

/// Stored state of a bucket-set resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketsRecord {
    pub name: String,
    pub bucket_capacity: i64,
    pub maximum_buckets: usize,
    pub items: BTreeMap<Key, Item>,
    pub buckets: PackingState,
}

impl BucketsRecord {
    pub fn new(config: &BucketsConfig, buckets: PackingState) -> Self {
        Self {
            name: config.name.clone(),
            bucket_capacity: config.bucket_capacity,
            maximum_buckets: config.maximum_buckets,
            items: config.items.clone(),
            buckets,
        }
    }

    /// Whether `config` changes a parameter that forces a rebuild from
    /// scratch instead of an incremental update.
    pub fn requires_replace(&self, config: &BucketsConfig) -> bool {
        self.bucket_capacity != config.bucket_capacity
            || self.maximum_buckets != config.maximum_buckets
    }
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Every stored record, as returned by [`crate::StateStore::snapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub counters: Vec<CounterRecord>,
    pub buckets: Vec<BucketsRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.buckets.is_empty()
    }
}
