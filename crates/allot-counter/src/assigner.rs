//! Identifier assigner.
//!
//! Given the desired keys and the previous mapping, the assigner:
//! 1. Keeps every prior entry that is still desired and not below `initial`
//! 2. Walks the remaining keys in lexicographic order
//! 3. Hands each one the next watermark value, or the smallest free
//!    value when reuse is enabled
//!
//! Lexicographic order is what makes the output independent of how the
//! caller enumerated its keys.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use allot_core::{IdentifierState, Key};

use crate::error::{AssignError, AssignResult};

/// Policy parameters for a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignPolicy {
    /// Lowest identifier that may be handed out.
    pub initial: i64,
    /// Hand out identifiers freed by removed keys again.
    pub reuse: bool,
}

/// Assign identifiers to `keys`, preserving `prior` where possible.
///
/// `last` is the watermark persisted alongside `prior`. Duplicate keys
/// are collapsed.
pub fn assign_keys<'a, I>(
    keys: I,
    prior: Option<&BTreeMap<Key, i64>>,
    policy: AssignPolicy,
    last: i64,
) -> AssignResult<IdentifierState>
where
    I: IntoIterator<Item = &'a str>,
{
    assign_from(keys, prior, policy, Some(last))
}

/// First assignment for a counter that has no persisted state yet.
///
/// The watermark starts one below `initial` so the first key receives
/// `initial` itself.
pub fn create<'a, I>(keys: I, policy: AssignPolicy) -> AssignResult<IdentifierState>
where
    I: IntoIterator<Item = &'a str>,
{
    assign_from(keys, None, policy, policy.initial.checked_sub(1))
}

/// Reassignment against a previously persisted state.
pub fn update<'a, I>(
    keys: I,
    prior: &IdentifierState,
    policy: AssignPolicy,
) -> AssignResult<IdentifierState>
where
    I: IntoIterator<Item = &'a str>,
{
    assign_from(keys, Some(&prior.values), policy, Some(prior.last_value))
}

/// `last` is `None` only when the watermark sits below `i64::MIN`.
fn assign_from<'a, I>(
    keys: I,
    prior: Option<&BTreeMap<Key, i64>>,
    policy: AssignPolicy,
    mut last: Option<i64>,
) -> AssignResult<IdentifierState>
where
    I: IntoIterator<Item = &'a str>,
{
    let AssignPolicy { initial, reuse } = policy;
    // BTreeSet gives the sorted walk order.
    let keys: BTreeSet<&str> = keys.into_iter().collect();

    let mut values: BTreeMap<Key, i64> = BTreeMap::new();
    if let Some(prior) = prior {
        for (key, &value) in prior {
            if keys.contains(key.as_str()) && value >= initial {
                values.insert(key.clone(), value);
            }
        }
    }
    let mut used: BTreeSet<i64> = values.values().copied().collect();

    // The used set only grows during a pass, so the smallest free value
    // never moves backwards.
    let mut cursor = initial;

    for key in keys {
        if values.contains_key(key) {
            continue;
        }
        let exhausted = || AssignError::Exhausted {
            key: key.to_string(),
        };

        let value = if reuse {
            while used.contains(&cursor) {
                cursor = cursor.checked_add(1).ok_or_else(exhausted)?;
            }
            cursor
        } else {
            match last {
                Some(last) => last.checked_add(1).ok_or_else(exhausted)?.max(initial),
                None => initial,
            }
        };
        last = Some(last.map_or(value, |last| last.max(value)));

        used.insert(value);
        values.insert(key.to_string(), value);
        debug!(key, value, reuse, "assigned identifier");
    }

    Ok(IdentifierState {
        // Nothing handed out yet from a watermark below i64::MIN.
        last_value: last.unwrap_or(initial),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial: i64, reuse: bool) -> AssignPolicy {
        AssignPolicy { initial, reuse }
    }

    fn mapping(entries: &[(&str, i64)]) -> BTreeMap<Key, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn empty_keys_keep_watermark() {
        let state = assign_keys(std::iter::empty(), None, policy(5, false), 5).unwrap();
        assert_eq!(state.last_value, 5);
        assert!(state.is_empty());
    }

    #[test]
    fn empty_keys_drop_prior_entries() {
        let prior = mapping(&[("a", 5), ("b", 6)]);
        let state = assign_keys(std::iter::empty(), Some(&prior), policy(5, true), 6).unwrap();
        assert!(state.is_empty());
        assert_eq!(state.last_value, 6);
    }

    #[test]
    fn fresh_keys_start_at_initial_in_sorted_order() {
        let state = assign_keys(["a", "c", "b"], None, policy(5, false), 4).unwrap();
        assert_eq!(state.values, mapping(&[("a", 5), ("b", 6), ("c", 7)]));
        assert_eq!(state.last_value, 7);
    }

    #[test]
    fn unchanged_input_is_a_no_op() {
        let prior = mapping(&[("a", 5), ("b", 9), ("c", 11)]);
        for reuse in [false, true] {
            let state = assign_keys(["a", "c", "b"], Some(&prior), policy(5, reuse), 11).unwrap();
            assert_eq!(state.values, prior);
            assert_eq!(state.last_value, 11);
        }
    }

    #[test]
    fn new_key_extends_watermark_without_reuse() {
        let prior = mapping(&[("a", 5), ("b", 6), ("c", 7)]);
        let state = assign_keys(["d", "a", "c"], Some(&prior), policy(5, false), 7).unwrap();
        assert_eq!(state.values, mapping(&[("a", 5), ("c", 7), ("d", 8)]));
        assert_eq!(state.last_value, 8);
    }

    #[test]
    fn new_key_fills_gap_with_reuse() {
        let prior = mapping(&[("a", 5), ("b", 6), ("c", 7)]);
        let state = assign_keys(["d", "a", "c"], Some(&prior), policy(5, true), 7).unwrap();
        assert_eq!(state.values, mapping(&[("a", 5), ("c", 7), ("d", 6)]));
        // Filling a gap below the watermark leaves it where it was.
        assert_eq!(state.last_value, 7);
    }

    #[test]
    fn reuse_raises_watermark_past_existing_values() {
        let prior = mapping(&[("a", 0), ("b", 1)]);
        let state = assign_keys(["a", "b", "c", "d"], Some(&prior), policy(0, true), 1).unwrap();
        assert_eq!(state.get("c"), Some(2));
        assert_eq!(state.get("d"), Some(3));
        assert_eq!(state.last_value, 3);
    }

    #[test]
    fn reuse_fills_multiple_gaps_smallest_key_first() {
        let prior = mapping(&[("a", 1), ("c", 3), ("e", 5)]);
        let state = assign_keys(
            ["e", "z", "a", "y", "c", "x"],
            Some(&prior),
            policy(1, true),
            5,
        )
        .unwrap();
        assert_eq!(state.get("x"), Some(2));
        assert_eq!(state.get("y"), Some(4));
        assert_eq!(state.get("z"), Some(6));
        assert_eq!(state.last_value, 6);
    }

    #[test]
    fn raising_initial_renumbers_stale_entries() {
        let prior = mapping(&[("a", 5), ("b", 6), ("c", 20)]);
        let state = assign_keys(["a", "b", "c"], Some(&prior), policy(10, false), 20).unwrap();
        // c survives, a and b fall below the new floor.
        assert_eq!(state.get("c"), Some(20));
        assert_eq!(state.get("a"), Some(21));
        assert_eq!(state.get("b"), Some(22));
    }

    #[test]
    fn raising_initial_with_reuse_starts_at_new_floor() {
        let prior = mapping(&[("a", 1), ("b", 2)]);
        let state = assign_keys(["a", "b"], Some(&prior), policy(10, true), 2).unwrap();
        assert_eq!(state.values, mapping(&[("a", 10), ("b", 11)]));
    }

    #[test]
    fn watermark_below_initial_jumps_to_initial() {
        let state = assign_keys(["a"], None, policy(100, false), 3).unwrap();
        assert_eq!(state.get("a"), Some(100));
        assert_eq!(state.last_value, 100);
    }

    #[test]
    fn output_does_not_depend_on_key_order() {
        let prior = mapping(&[("m", 2)]);
        let first = assign_keys(["q", "b", "m", "k"], Some(&prior), policy(0, true), 2).unwrap();
        let second = assign_keys(["k", "m", "b", "q"], Some(&prior), policy(0, true), 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get("b"), Some(0));
        assert_eq!(first.get("k"), Some(1));
        assert_eq!(first.get("q"), Some(3));
    }

    #[test]
    fn duplicate_keys_collapse() {
        let state = assign_keys(["a", "a", "b"], None, policy(0, false), -1).unwrap();
        assert_eq!(state.values, mapping(&[("a", 0), ("b", 1)]));
    }

    #[test]
    fn no_reuse_never_hands_out_a_value_twice() {
        let p = policy(1, false);
        let mut seen = Vec::new();

        let s1 = create(["a", "b"], p).unwrap();
        seen.extend(s1.values.values().copied());

        // Drop "a", add "c".
        let s2 = update(["b", "c"], &s1, p).unwrap();
        // Re-add "a"; it must not get its old value back.
        let s3 = update(["a", "b", "c"], &s2, p).unwrap();

        for (state, key) in [(&s2, "c"), (&s3, "a")] {
            let value = state.get(key).unwrap();
            assert!(!seen.contains(&value), "{value} handed out twice");
            assert!(seen.iter().all(|v| *v < value));
            seen.push(value);
        }
        assert_eq!(s3.get("b"), Some(2));
        assert_eq!(s3.last_value, 4);
    }

    #[test]
    fn create_starts_one_below_initial() {
        let state = create(["x"], policy(7, false)).unwrap();
        assert_eq!(state.get("x"), Some(7));
        assert_eq!(state.last_value, 7);
    }

    #[test]
    fn update_keeps_stable_keys() {
        let p = policy(0, true);
        let prior = create(["a", "b", "c"], p).unwrap();
        let next = update(["c", "d", "a"], &prior, p).unwrap();
        assert_eq!(next.get("a"), prior.get("a"));
        assert_eq!(next.get("c"), prior.get("c"));
        assert_eq!(next.get("d"), prior.get("b"));
    }

    #[test]
    fn watermark_at_max_reports_exhaustion() {
        let err =
            assign_keys(["a", "b"], None, policy(i64::MAX, false), i64::MAX - 1).unwrap_err();
        assert_eq!(
            err,
            AssignError::Exhausted {
                key: "b".to_string()
            }
        );

        let state = assign_keys(["a"], None, policy(i64::MAX, false), i64::MAX - 1).unwrap();
        assert_eq!(state.get("a"), Some(i64::MAX));
        assert_eq!(state.last_value, i64::MAX);
    }

    #[test]
    fn reuse_with_max_taken_reports_exhaustion() {
        let prior = mapping(&[("a", i64::MAX - 1), ("b", i64::MAX)]);
        let err = assign_keys(["a", "b", "c"], Some(&prior), policy(i64::MAX - 1, true), i64::MAX)
            .unwrap_err();
        assert!(matches!(err, AssignError::Exhausted { key } if key == "c"));
    }

    #[test]
    fn reuse_fills_gap_below_max() {
        let prior = mapping(&[("a", i64::MAX)]);
        let state =
            assign_keys(["a", "b"], Some(&prior), policy(i64::MAX - 1, true), i64::MAX).unwrap();
        assert_eq!(state.get("b"), Some(i64::MAX - 1));
        assert_eq!(state.last_value, i64::MAX);
    }

    #[test]
    fn create_at_min_hands_out_min() {
        for reuse in [false, true] {
            let state = create(["a", "b"], policy(i64::MIN, reuse)).unwrap();
            assert_eq!(state.get("a"), Some(i64::MIN));
            assert_eq!(state.get("b"), Some(i64::MIN + 1));
            assert_eq!(state.last_value, i64::MIN + 1);
        }
    }
}
