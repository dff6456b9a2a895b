use std::path::Path;

use anyhow::{Context, bail};

use allot_core::AllotConfig;
use allot_reconcile::{ReconcileReport, Reconciler, format_report};
use allot_state::StateStore;

use crate::Format;

pub fn plan(file: &Path, state: &Path, format: Format) -> anyhow::Result<()> {
    let (reconciler, config) = open(file, state)?;
    let report = reconciler.plan(&config)?;
    print_report(&report, format)
}

pub fn apply(file: &Path, state: &Path, format: Format) -> anyhow::Result<()> {
    let (reconciler, config) = open(file, state)?;
    let report = reconciler.apply(&config)?;
    print_report(&report, format)?;

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} resource(s) failed to apply");
    }
    Ok(())
}

fn open(file: &Path, state: &Path) -> anyhow::Result<(Reconciler, AllotConfig)> {
    let config = AllotConfig::from_file(file)?;
    let store = StateStore::open(state)
        .with_context(|| format!("failed to open state {}", state.display()))?;
    Ok((Reconciler::new(store), config))
}

fn print_report(report: &ReconcileReport, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Format::Text => print!("{}", format_report(report)),
    }
    Ok(())
}
