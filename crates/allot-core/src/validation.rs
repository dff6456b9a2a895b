// Configuration validation
//
// The allocators assume positive weights, capacities and bucket counts;
// this is where those assumptions are enforced.

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use tracing::warn;

use crate::config::{AllotConfig, BucketsConfig, CounterConfig};

/// Upper bound on `maximum_buckets`. Every bucket is materialized on each
/// pack, so the count has to stay allocatable.
pub const MAX_BUCKETS: usize = 65_536;

pub fn validate_config(config: &AllotConfig) -> Result<()> {
    let mut names = BTreeSet::new();
    for counter in &config.counters {
        validate_name("counter", &counter.name, &mut names)?;
        validate_counter_config(counter)?;
    }

    let mut names = BTreeSet::new();
    for buckets in &config.buckets {
        validate_name("buckets", &buckets.name, &mut names)?;
        validate_buckets_config(buckets)?;
    }

    Ok(())
}

fn validate_name<'a>(kind: &str, name: &'a str, seen: &mut BTreeSet<&'a str>) -> Result<()> {
    if name.is_empty() {
        bail!("{kind}.name must not be empty");
    }
    if !seen.insert(name) {
        bail!("{kind} \"{name}\" is declared more than once");
    }
    Ok(())
}

pub fn validate_counter_config(config: &CounterConfig) -> Result<()> {
    if config.keys.iter().any(String::is_empty) {
        bail!("counter \"{}\": keys must not be empty strings", config.name);
    }

    let unique = config.unique_keys().len();
    if unique != config.keys.len() {
        warn!(
            counter = %config.name,
            duplicates = config.keys.len() - unique,
            "duplicate keys collapsed"
        );
    }

    Ok(())
}

pub fn validate_buckets_config(config: &BucketsConfig) -> Result<()> {
    if config.bucket_capacity < 1 {
        bail!(
            "buckets \"{}\": bucket_capacity must be at least 1",
            config.name
        );
    }

    if config.maximum_buckets < 1 {
        bail!(
            "buckets \"{}\": maximum_buckets must be at least 1",
            config.name
        );
    }
    if config.maximum_buckets > MAX_BUCKETS {
        bail!(
            "buckets \"{}\": maximum_buckets must be at most {MAX_BUCKETS}",
            config.name
        );
    }

    for (key, item) in &config.items {
        if key.is_empty() {
            bail!("buckets \"{}\": item keys must not be empty", config.name);
        }
        if item.weight < 1 {
            bail!(
                "buckets \"{}\": item \"{key}\" weight must be at least 1",
                config.name
            );
        }
        // Never placeable, but the packer reports that itself.
        if item.weight > config.bucket_capacity {
            warn!(
                buckets = %config.name,
                item = %key,
                weight = item.weight,
                bucket_capacity = config.bucket_capacity,
                "item is heavier than a whole bucket"
            );
        }
    }

    Ok(())
}
