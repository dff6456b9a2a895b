//! Packer error types.

use thiserror::Error;

/// Result type alias for packing operations.
pub type PackResult<T> = Result<T, PackError>;

/// Errors that can occur while packing items into buckets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// No bucket has room for `key` under the first-fit rule.
    ///
    /// `previous_weight` is set when an already placed item grew;
    /// `capacities` is the used capacity of every bucket at the moment
    /// the search failed.
    #[error(
        "unable to find bucket capacity for: {key} ({}); bucket capacities: {capacities:?}",
        describe_weight(.weight, .previous_weight)
    )]
    CapacityExhausted {
        key: String,
        weight: i64,
        previous_weight: Option<i64>,
        capacities: Vec<i64>,
    },
}

impl PackError {
    /// The key of the item that could not be placed.
    pub fn key(&self) -> &str {
        match self {
            PackError::CapacityExhausted { key, .. } => key,
        }
    }

    pub fn capacities(&self) -> &[i64] {
        match self {
            PackError::CapacityExhausted { capacities, .. } => capacities,
        }
    }
}

fn describe_weight(weight: &i64, previous: &Option<i64>) -> String {
    match previous {
        Some(previous) => format!("previous weight {previous}, new weight {weight}"),
        None => format!("weight {weight}"),
    }
}
