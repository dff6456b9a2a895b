//! Reconciler — maps declared resources onto persisted allocations.
//!
//! Each resource is computed from its declaration plus the stored record,
//! then committed with a single store write. Nothing is written for a
//! resource whose allocation fails, so its previous record stays
//! authoritative.

use tracing::{debug, info, warn};

use allot_buckets::{PackPolicy, pack};
use allot_core::validation::{validate_buckets_config, validate_counter_config};
use allot_core::{AllotConfig, BucketsConfig, CounterConfig, ResourceKind, validate_config};
use allot_counter::AssignPolicy;
use allot_state::{BucketsRecord, CounterRecord, Snapshot, StateStore};

use crate::error::{ReconcileError, ReconcileResult};
use crate::report::{
    Outcome, ReconcileReport, ResourceReport, summarize_buckets, summarize_counter,
};

/// Drives counters and bucket sets from configuration to stored records.
#[derive(Clone)]
pub struct Reconciler {
    state: StateStore,
}

impl Reconciler {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Every stored record.
    pub fn snapshot(&self) -> ReconcileResult<Snapshot> {
        Ok(self.state.snapshot()?)
    }

    // ── Single resources ───────────────────────────────────────────

    /// Compute the next record for a counter without committing it.
    ///
    /// Returns [`ReconcileError::Identifiers`] when the identifier range
    /// runs out.
    pub fn plan_counter(&self, config: &CounterConfig) -> ReconcileResult<(Outcome, CounterRecord)> {
        validate_counter_config(config)?;

        let keys = config.keys.iter().map(String::as_str);
        let policy = AssignPolicy {
            initial: config.initial_value,
            reuse: config.reuse,
        };

        match self.state.get_counter(&config.name)? {
            None => {
                let assignment = allot_counter::create(keys, policy)?;
                Ok((Outcome::Created, CounterRecord::new(config, assignment)))
            }
            Some(prior) => {
                let assignment = allot_counter::update(keys, &prior.assignment, policy)?;
                let record = CounterRecord::new(config, assignment);
                let outcome = if record == prior {
                    Outcome::Unchanged
                } else {
                    Outcome::Updated
                };
                Ok((outcome, record))
            }
        }
    }

    /// Compute the next record for a bucket set without committing it.
    ///
    /// Returns [`ReconcileError::Capacity`] when the items do not fit.
    pub fn plan_buckets(&self, config: &BucketsConfig) -> ReconcileResult<(Outcome, BucketsRecord)> {
        validate_buckets_config(config)?;

        let policy = PackPolicy {
            bucket_capacity: config.bucket_capacity,
            max_buckets: config.maximum_buckets,
        };

        let prior = self.state.get_buckets(&config.name)?;
        let (outcome, base) = match &prior {
            None => (Outcome::Created, None),
            Some(prior) if prior.requires_replace(config) => {
                debug!(
                    name = %config.name,
                    from_capacity = prior.bucket_capacity,
                    to_capacity = config.bucket_capacity,
                    from_buckets = prior.maximum_buckets,
                    to_buckets = config.maximum_buckets,
                    "bucket geometry changed, rebuilding"
                );
                (Outcome::Replaced, None)
            }
            Some(prior) => (Outcome::Updated, Some(&prior.buckets)),
        };

        let buckets = pack(&config.items, base, policy)?;
        let record = BucketsRecord::new(config, buckets);

        let outcome = match prior {
            Some(prior) if outcome == Outcome::Updated && prior == record => Outcome::Unchanged,
            _ => outcome,
        };
        Ok((outcome, record))
    }

    /// Reconcile one counter and commit the result.
    ///
    /// On failure the stored record is untouched.
    pub fn apply_counter(&self, config: &CounterConfig) -> ReconcileResult<(Outcome, CounterRecord)> {
        let (outcome, record) = self.plan_counter(config)?;
        if outcome.is_change() {
            self.state.put_counter(&record)?;
        }
        Ok((outcome, record))
    }

    /// Reconcile one bucket set and commit the result.
    ///
    /// On failure the stored record is untouched.
    pub fn apply_buckets(&self, config: &BucketsConfig) -> ReconcileResult<(Outcome, BucketsRecord)> {
        let (outcome, record) = self.plan_buckets(config)?;
        if outcome.is_change() {
            self.state.put_buckets(&record)?;
        }
        Ok((outcome, record))
    }

    /// The stored record of a counter, or `StateError::NotFound`.
    pub fn read_counter(&self, name: &str) -> ReconcileResult<CounterRecord> {
        Ok(self.state.require_counter(name)?)
    }

    /// The stored record of a bucket set, or `StateError::NotFound`.
    pub fn read_buckets(&self, name: &str) -> ReconcileResult<BucketsRecord> {
        Ok(self.state.require_buckets(name)?)
    }

    /// Remove a stored resource. Returns true if it existed.
    pub fn delete(&self, kind: ResourceKind, name: &str) -> ReconcileResult<bool> {
        let existed = match kind {
            ResourceKind::Counter => self.state.delete_counter(name)?,
            ResourceKind::Buckets => self.state.delete_buckets(name)?,
        };
        if existed {
            info!(%kind, name, "resource deleted");
        }
        Ok(existed)
    }

    // ── Whole configuration ────────────────────────────────────────

    /// Compute what [`Reconciler::apply`] would do, without writing.
    pub fn plan(&self, config: &AllotConfig) -> ReconcileResult<ReconcileReport> {
        self.run(config, false)
    }

    /// Reconcile every declared resource and prune undeclared ones.
    ///
    /// Allocation failures are reported per resource; store failures
    /// abort the run.
    pub fn apply(&self, config: &AllotConfig) -> ReconcileResult<ReconcileReport> {
        self.run(config, true)
    }

    fn run(&self, config: &AllotConfig, commit: bool) -> ReconcileResult<ReconcileReport> {
        validate_config(config)?;

        let mut report = ReconcileReport {
            dry_run: !commit,
            resources: Vec::new(),
        };

        for counter in &config.counters {
            let result = if commit {
                self.apply_counter(counter)
            } else {
                self.plan_counter(counter)
            };
            let (outcome, summary) = match result {
                Ok((outcome, record)) => (outcome, Some(summarize_counter(&record))),
                Err(err) if err.is_allocation_failure() => failed(&err),
                Err(err) => return Err(err),
            };
            log_outcome(ResourceKind::Counter, &counter.name, &outcome, commit);
            report.resources.push(ResourceReport {
                kind: ResourceKind::Counter,
                name: counter.name.clone(),
                outcome,
                summary,
            });
        }

        for buckets in &config.buckets {
            let result = if commit {
                self.apply_buckets(buckets)
            } else {
                self.plan_buckets(buckets)
            };
            let (outcome, summary) = match result {
                Ok((outcome, record)) => (outcome, Some(summarize_buckets(&record))),
                Err(err) if err.is_allocation_failure() => failed(&err),
                Err(err) => return Err(err),
            };
            log_outcome(ResourceKind::Buckets, &buckets.name, &outcome, commit);
            report.resources.push(ResourceReport {
                kind: ResourceKind::Buckets,
                name: buckets.name.clone(),
                outcome,
                summary,
            });
        }

        self.prune(config, commit, &mut report)?;
        Ok(report)
    }

    /// Delete stored records that the configuration no longer declares.
    fn prune(
        &self,
        config: &AllotConfig,
        commit: bool,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let mut stale = Vec::new();
        for record in self.state.list_counters()? {
            if config.counter(&record.name).is_none() {
                stale.push((ResourceKind::Counter, record.name));
            }
        }
        for record in self.state.list_buckets()? {
            if config.bucket_set(&record.name).is_none() {
                stale.push((ResourceKind::Buckets, record.name));
            }
        }

        for (kind, name) in stale {
            if commit {
                self.delete(kind, &name)?;
            } else {
                debug!(%kind, %name, "would delete undeclared resource");
            }
            report.resources.push(ResourceReport {
                kind,
                name,
                outcome: Outcome::Deleted,
                summary: None,
            });
        }
        Ok(())
    }
}

fn failed(err: &ReconcileError) -> (Outcome, Option<String>) {
    let outcome = Outcome::Failed {
        error: err.to_string(),
    };
    (outcome, None)
}

fn log_outcome(kind: ResourceKind, name: &str, outcome: &Outcome, commit: bool) {
    match outcome {
        Outcome::Failed { error } => {
            warn!(%kind, name, %error, "resource not reconciled, previous state kept");
        }
        Outcome::Unchanged => debug!(%kind, name, "resource unchanged"),
        _ if commit => info!(%kind, name, outcome = outcome.label(), "resource reconciled"),
        _ => debug!(%kind, name, outcome = outcome.label(), "resource planned"),
    }
}
