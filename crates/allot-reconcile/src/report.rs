//! Reconciliation reports and their human-readable formatting.

use serde::Serialize;

use allot_core::ResourceKind;
use allot_state::{BucketsRecord, CounterRecord, Snapshot};

/// What happened (or would happen, in a dry run) to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    /// Rebuilt from scratch after a capacity or bucket-count change.
    Replaced,
    Unchanged,
    Deleted,
    /// The allocation failed; the stored record was left as it was.
    Failed { error: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Replaced => "replaced",
            Outcome::Unchanged => "unchanged",
            Outcome::Deleted => "deleted",
            Outcome::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// Whether committing this outcome writes to the store.
    pub fn is_change(&self) -> bool {
        !matches!(self, Outcome::Unchanged | Outcome::Failed { .. })
    }
}

/// Outcome for a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// One-line description of the resulting allocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Outcome of a whole plan or apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub dry_run: bool,
    pub resources: Vec<ResourceReport>,
}

impl ReconcileReport {
    pub fn has_failures(&self) -> bool {
        self.resources.iter().any(|r| r.outcome.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceReport> {
        self.resources.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn changes(&self) -> usize {
        self.resources.iter().filter(|r| r.outcome.is_change()).count()
    }

    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<&ResourceReport> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.name == name)
    }
}

pub(crate) fn summarize_counter(record: &CounterRecord) -> String {
    format!(
        "{} keys, last value {}",
        record.assignment.len(),
        record.assignment.last_value
    )
}

pub(crate) fn summarize_buckets(record: &BucketsRecord) -> String {
    format!(
        "{} items in {} buckets, used {:?} of {}",
        record.buckets.item_count(),
        record.buckets.len(),
        record.buckets.capacities(),
        record.bucket_capacity
    )
}

pub fn format_report(report: &ReconcileReport) -> String {
    let mut out = String::new();

    let verb = if report.dry_run { "Plan" } else { "Apply" };
    out.push_str(&format!(
        "{verb}: {} resources, {} changes, {} failed\n\n",
        report.resources.len(),
        report.changes(),
        report.failures().count()
    ));

    for r in &report.resources {
        out.push_str(&format!(
            "  {:<9} {:<8} {}\n",
            r.outcome.label(),
            r.kind.as_str(),
            r.name
        ));
        if let Some(summary) = &r.summary {
            out.push_str(&format!("            {summary}\n"));
        }
        if let Outcome::Failed { error } = &r.outcome {
            out.push_str(&format!("            error: {error}\n"));
        }
    }

    out
}

pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    if snapshot.is_empty() {
        out.push_str("No resources in state.\n");
        return out;
    }

    for counter in &snapshot.counters {
        out.push_str(&format!(
            "counter {} (initial {}, reuse {}, last value {}):\n",
            counter.name, counter.initial_value, counter.reuse, counter.assignment.last_value
        ));
        for (key, value) in &counter.assignment.values {
            out.push_str(&format!("  {key} = {value}\n"));
        }
        out.push('\n');
    }

    for set in &snapshot.buckets {
        out.push_str(&format!(
            "buckets {} (capacity {}, {} buckets):\n",
            set.name, set.bucket_capacity, set.maximum_buckets
        ));
        for (ordinal, bucket) in set.buckets.buckets.iter().enumerate() {
            out.push_str(&format!(
                "  [{ordinal}] {}/{}\n",
                bucket.used(),
                set.bucket_capacity
            ));
            for (key, item) in &bucket.items {
                if item.item.is_empty() {
                    out.push_str(&format!("      {key} ({})\n", item.weight));
                } else {
                    out.push_str(&format!("      {key} ({}): {}\n", item.weight, item.item));
                }
            }
        }
        out.push('\n');
    }

    out
}
