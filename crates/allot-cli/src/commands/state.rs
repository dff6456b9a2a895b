use std::path::Path;

use anyhow::Context;

use allot_core::ResourceKind;
use allot_reconcile::{Reconciler, format_snapshot};
use allot_state::{Snapshot, StateStore};

use crate::Format;

fn reconciler(state: &Path) -> anyhow::Result<Reconciler> {
    let store = StateStore::open(state)
        .with_context(|| format!("failed to open state {}", state.display()))?;
    Ok(Reconciler::new(store))
}

pub fn show(state: &Path, format: Format) -> anyhow::Result<()> {
    let snapshot = reconciler(state)?.snapshot()?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        Format::Text => print!("{}", format_snapshot(&snapshot)),
    }
    Ok(())
}

pub fn show_one(state: &Path, kind: ResourceKind, name: &str, format: Format) -> anyhow::Result<()> {
    let reconciler = reconciler(state)?;
    let snapshot = match kind {
        ResourceKind::Counter => {
            let record = reconciler.read_counter(name)?;
            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }
            Snapshot {
                counters: vec![record],
                ..Snapshot::default()
            }
        }
        ResourceKind::Buckets => {
            let record = reconciler.read_buckets(name)?;
            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }
            Snapshot {
                buckets: vec![record],
                ..Snapshot::default()
            }
        }
    };
    print!("{}", format_snapshot(&snapshot));
    Ok(())
}

pub fn delete(state: &Path, kind: ResourceKind, name: &str) -> anyhow::Result<()> {
    if reconciler(state)?.delete(kind, name)? {
        println!("✓ Deleted {kind} {name}");
    } else {
        println!("{kind} {name} not in state");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allot_core::CounterConfig;

    fn seeded(state: &Path) {
        let reconciler = Reconciler::new(StateStore::open(state).unwrap());
        reconciler
            .apply_counter(&CounterConfig {
                name: "ports".to_string(),
                keys: vec!["api".to_string()],
                initial_value: 8000,
                reuse: false,
            })
            .unwrap();
    }

    #[test]
    fn show_missing_resource_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("allot.redb");
        seeded(&state);

        show(&state, Format::Text).unwrap();
        show_one(&state, ResourceKind::Counter, "ports", Format::Json).unwrap();
        let err = show_one(&state, ResourceKind::Buckets, "ports", Format::Text).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("allot.redb");
        seeded(&state);

        delete(&state, ResourceKind::Counter, "ports").unwrap();
        delete(&state, ResourceKind::Counter, "ports").unwrap();

        let store = StateStore::open(&state).unwrap();
        assert!(store.get_counter("ports").unwrap().is_none());
    }
}
