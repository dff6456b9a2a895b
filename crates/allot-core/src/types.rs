//! Shared types used across allot crates.
//!
//! Every map is a `BTreeMap` so that serialized state is byte-for-byte
//! reproducible for identical inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque, caller-supplied identifier for a counter key or a bucket item.
pub type Key = String;

/// The two kinds of resource allot manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Counter,
    Buckets,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Counter => "counter",
            ResourceKind::Buckets => "buckets",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(ResourceKind::Counter),
            "buckets" => Ok(ResourceKind::Buckets),
            other => Err(format!("unknown resource kind: {other} (expected counter or buckets)")),
        }
    }
}

// ── Identifiers ───────────────────────────────────────────────────

/// Key → identifier mapping plus the last-value watermark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierState {
    /// Highest identifier handed out in non-reuse mode.
    pub last_value: i64,
    pub values: BTreeMap<Key, i64>,
}

impl IdentifierState {
    pub fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Items & buckets ───────────────────────────────────────────────

/// A weighted item with an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Counts against the capacity of the bucket holding the item.
    pub weight: i64,
    /// Payload carried along with the item. May be empty.
    #[serde(default)]
    pub item: String,
}

impl Item {
    pub fn new(weight: i64, item: impl Into<String>) -> Self {
        Self {
            weight,
            item: item.into(),
        }
    }
}

/// One fixed-ordinal, capacity-bounded container of items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket {
    pub items: BTreeMap<Key, Item>,
}

impl Bucket {
    /// Sum of the weights of every contained item.
    pub fn used(&self) -> i64 {
        self.items.values().map(|i| i.weight).sum()
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The ordered bucket sequence persisted between reconciliations.
///
/// There is no separate key → bucket index; [`PackingState::locate`]
/// reconstructs it by scanning bucket contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackingState {
    pub buckets: Vec<Bucket>,
}

impl PackingState {
    /// `count` empty buckets.
    pub fn empty(count: usize) -> Self {
        Self {
            buckets: vec![Bucket::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Used capacity of every bucket, in ordinal order.
    pub fn capacities(&self) -> Vec<i64> {
        self.buckets.iter().map(Bucket::used).collect()
    }

    /// Ordinal of the bucket holding `key`, if any.
    pub fn locate(&self, key: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.contains(key))
    }

    /// Total number of items across all buckets.
    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(entries: &[(&str, i64)]) -> Bucket {
        Bucket {
            items: entries
                .iter()
                .map(|(k, w)| (k.to_string(), Item::new(*w, "")))
                .collect(),
        }
    }

    #[test]
    fn bucket_used_sums_weights() {
        assert_eq!(bucket(&[("a", 50), ("b", 25), ("c", 10)]).used(), 85);
        assert_eq!(Bucket::default().used(), 0);
    }

    #[test]
    fn packing_state_locates_keys() {
        let state = PackingState {
            buckets: vec![bucket(&[("a", 10)]), Bucket::default(), bucket(&[("b", 5)])],
        };
        assert_eq!(state.locate("a"), Some(0));
        assert_eq!(state.locate("b"), Some(2));
        assert_eq!(state.locate("zz"), None);
        assert_eq!(state.capacities(), vec![10, 0, 5]);
        assert_eq!(state.item_count(), 2);
    }

    #[test]
    fn empty_state_keeps_every_bucket() {
        let state = PackingState::empty(3);
        assert_eq!(state.len(), 3);
        assert!(state.buckets.iter().all(Bucket::is_empty));
    }

    #[test]
    fn buckets_serialize_as_plain_maps() {
        let state = PackingState {
            buckets: vec![bucket(&[("item-1", 50)]), Bucket::default()],
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"[{"item-1":{"weight":50,"item":""}},{}]"#);

        let back: PackingState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn resource_kind_parses_its_own_name() {
        for kind in [ResourceKind::Counter, ResourceKind::Buckets] {
            assert_eq!(kind.to_string().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("bucket".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn item_payload_defaults_to_empty() {
        let item: Item = serde_json::from_str(r#"{"weight":7}"#).unwrap();
        assert_eq!(item, Item::new(7, ""));
    }
}
