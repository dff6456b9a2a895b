//! Packing engine — reconciles desired items against prior buckets.
//!
//! Given the desired items and the previous bucket contents, the packer
//! runs four phases in order:
//! 1. Resize items whose weight changed (in place if they still fit,
//!    otherwise moved to the first bucket with room)
//! 2. Evict items that are no longer desired
//! 3. Place new items, smallest key first, into the first bucket with room
//! 4. Emit every bucket, empty ones included
//!
//! Resizing runs before eviction and placement so a shrinking item frees
//! room for the rest of the pass. Items untouched by phases 1 and 2 never
//! change bucket.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use allot_core::{Bucket, Item, Key, PackingState};

use crate::error::{PackError, PackResult};

/// Policy parameters for a bucket set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackPolicy {
    /// Upper bound on the summed weight of a single bucket.
    pub bucket_capacity: i64,
    /// Exact number of buckets in the output.
    pub max_buckets: usize,
}

/// Working copy of the bucket sequence plus its used-capacity counters.
struct Scratch {
    buckets: Vec<Bucket>,
    used: Vec<i64>,
    capacity: i64,
}

impl Scratch {
    /// Replay `prior` into `max_buckets` slots and index every key.
    ///
    /// Buckets past `max_buckets` are dropped; their items end up
    /// unindexed and get placed again as new items.
    fn replay(prior: Option<&PackingState>, policy: PackPolicy) -> (Self, HashMap<Key, usize>) {
        let mut buckets = vec![Bucket::default(); policy.max_buckets];
        let mut index = HashMap::new();

        if let Some(prior) = prior {
            for (ordinal, bucket) in prior.buckets.iter().enumerate() {
                if ordinal >= policy.max_buckets {
                    debug!(
                        ordinal,
                        items = bucket.len(),
                        "dropping bucket beyond maximum"
                    );
                    continue;
                }
                // A key duplicated across buckets stays in the first one.
                let mut bucket = bucket.clone();
                bucket.items.retain(|key, _| match index.entry(key.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(ordinal);
                        true
                    }
                    Entry::Occupied(_) => false,
                });
                buckets[ordinal] = bucket;
            }
        }

        let used = buckets.iter().map(Bucket::used).collect();
        let scratch = Scratch {
            buckets,
            used,
            capacity: policy.bucket_capacity,
        };
        (scratch, index)
    }

    fn fits(&self, ordinal: usize, weight: i64) -> bool {
        self.used[ordinal]
            .checked_add(weight)
            .is_some_and(|total| total <= self.capacity)
    }

    /// First bucket, in ascending order, with room for `weight`.
    fn first_fit(&self, weight: i64) -> Option<usize> {
        (0..self.used.len()).find(|&ordinal| self.fits(ordinal, weight))
    }

    fn insert(&mut self, ordinal: usize, key: Key, item: Item) {
        self.used[ordinal] += item.weight;
        self.buckets[ordinal].items.insert(key, item);
    }

    fn exhausted(&self, key: &str, weight: i64, previous_weight: Option<i64>) -> PackError {
        PackError::CapacityExhausted {
            key: key.to_string(),
            weight,
            previous_weight,
            capacities: self.used.clone(),
        }
    }

    fn finish(self) -> PackingState {
        PackingState {
            buckets: self.buckets,
        }
    }
}

/// Pack `desired` into buckets, starting from `prior`.
///
/// On success the returned state always holds exactly
/// `policy.max_buckets` buckets. On failure nothing is returned and the
/// caller keeps `prior` as the authoritative state.
///
/// The caller guarantees `bucket_capacity >= 1`, `max_buckets >= 1` and
/// positive weights.
pub fn pack(
    desired: &BTreeMap<Key, Item>,
    prior: Option<&PackingState>,
    policy: PackPolicy,
) -> PackResult<PackingState> {
    let (mut scratch, mut index) = Scratch::replay(prior, policy);

    resize_existing(&mut scratch, &mut index, desired)?;
    evict_removed(&mut scratch, desired);
    place_new(&mut scratch, &index, desired)?;

    debug!(
        items = desired.len(),
        buckets = policy.max_buckets,
        capacities = ?scratch.used,
        "packing complete"
    );
    Ok(scratch.finish())
}

/// Phase 1: reconcile items whose weight or payload changed.
fn resize_existing(
    scratch: &mut Scratch,
    index: &mut HashMap<Key, usize>,
    desired: &BTreeMap<Key, Item>,
) -> PackResult<()> {
    for (key, item) in desired {
        let Some(&current) = index.get(key) else {
            continue;
        };
        let Some(previous) = scratch.buckets[current].items.get(key).cloned() else {
            continue;
        };

        if previous.weight == item.weight {
            if previous.item != item.item {
                scratch.buckets[current].items.insert(key.clone(), item.clone());
            }
            continue;
        }

        scratch.used[current] -= previous.weight;

        if scratch.fits(current, item.weight) {
            scratch.insert(current, key.clone(), item.clone());
            debug!(
                key = %key,
                bucket = current,
                from = previous.weight,
                to = item.weight,
                "resized item in place"
            );
            continue;
        }

        let target = scratch
            .first_fit(item.weight)
            .ok_or_else(|| scratch.exhausted(key, item.weight, Some(previous.weight)))?;

        scratch.buckets[current].items.remove(key);
        scratch.insert(target, key.clone(), item.clone());
        index.insert(key.clone(), target);
        debug!(
            key = %key,
            from_bucket = current,
            to_bucket = target,
            weight = item.weight,
            "moved resized item"
        );
    }
    Ok(())
}

/// Phase 2: drop every item that is no longer desired.
fn evict_removed(scratch: &mut Scratch, desired: &BTreeMap<Key, Item>) {
    for (ordinal, bucket) in scratch.buckets.iter_mut().enumerate() {
        let mut freed = 0;
        bucket.items.retain(|key, item| {
            let keep = desired.contains_key(key);
            if !keep {
                freed += item.weight;
                debug!(key = %key, bucket = ordinal, "evicted item");
            }
            keep
        });
        scratch.used[ordinal] -= freed;
    }
}

/// Phase 3: first-fit every item that has no bucket yet, in key order.
fn place_new(
    scratch: &mut Scratch,
    index: &HashMap<Key, usize>,
    desired: &BTreeMap<Key, Item>,
) -> PackResult<()> {
    for (key, item) in desired {
        if index.contains_key(key) {
            continue;
        }
        let target = scratch
            .first_fit(item.weight)
            .ok_or_else(|| scratch.exhausted(key, item.weight, None))?;
        scratch.insert(target, key.clone(), item.clone());
        debug!(key = %key, bucket = target, weight = item.weight, "placed item");
    }
    Ok(())
}
