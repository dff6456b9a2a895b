//! allot.toml configuration parser.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::types::{Item, Key};

/// Desired state for every resource managed by allot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllotConfig {
    #[serde(default, rename = "counter", skip_serializing_if = "Vec::is_empty")]
    pub counters: Vec<CounterConfig>,
    #[serde(default, rename = "buckets", skip_serializing_if = "Vec::is_empty")]
    pub buckets: Vec<BucketsConfig>,
}

/// A named set of keys that receive stable numeric identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub name: String,
    pub keys: Vec<Key>,
    /// Lowest identifier that may be handed out.
    #[serde(default)]
    pub initial_value: i64,
    /// Allow identifiers freed by removed keys to be handed out again.
    #[serde(default)]
    pub reuse: bool,
}

/// A named set of weighted items packed into capacity-bounded buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketsConfig {
    pub name: String,
    pub bucket_capacity: i64,
    pub maximum_buckets: usize,
    #[serde(default)]
    pub items: BTreeMap<Key, Item>,
}

impl CounterConfig {
    /// The desired key set with duplicates collapsed.
    pub fn unique_keys(&self) -> BTreeSet<Key> {
        self.keys.iter().cloned().collect()
    }
}

impl AllotConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AllotConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn counter(&self, name: &str) -> Option<&CounterConfig> {
        self.counters.iter().find(|c| c.name == name)
    }

    pub fn bucket_set(&self, name: &str) -> Option<&BucketsConfig> {
        self.buckets.iter().find(|b| b.name == name)
    }

    /// Scaffold a minimal allot.toml with one resource of each kind.
    pub fn scaffold() -> Self {
        AllotConfig {
            counters: vec![CounterConfig {
                name: "ports".to_string(),
                keys: vec!["api".to_string(), "web".to_string()],
                initial_value: 8000,
                reuse: false,
            }],
            buckets: vec![BucketsConfig {
                name: "shards".to_string(),
                bucket_capacity: 100,
                maximum_buckets: 2,
                items: BTreeMap::from([
                    ("item-1".to_string(), Item::new(50, "some string data here")),
                    ("item-2".to_string(), Item::new(25, "")),
                ]),
            }],
        }
    }
}
