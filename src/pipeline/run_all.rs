// src/pipeline/run_all.rs

//! Run several sources concurrently and summarize the results.
//!
//! Each source gets its own fetch context, state file and notifier call;
//! nothing mutable is shared between sources.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::Result;
use crate::models::{Config, SourceConfig};
use crate::notify::{Notifier, SourceContext, notifier_from_config};
use crate::pipeline::{Monitor, RunOptions, RunReport};
use crate::services::AdapterRegistry;
use crate::storage::LocalStorage;
use crate::utils;
use crate::utils::http::FetchContext;

/// Result of one source within a multi-source run.
#[derive(Debug)]
pub struct SourceOutcome {
    pub name: String,
    pub result: Result<RunReport>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `names` (all configured sources when empty) concurrently.
pub async fn run_sources(
    config: &Config,
    registry: &AdapterRegistry,
    names: &[String],
) -> Result<Vec<SourceOutcome>> {
    let selected: Vec<&SourceConfig> = if names.is_empty() {
        config.sources.iter().collect()
    } else {
        names
            .iter()
            .map(|name| config.source(name))
            .collect::<Result<_>>()?
    };

    let notifier = if config.notify.enabled {
        Some(notifier_from_config(&config.notify)?)
    } else {
        None
    };

    let runs = selected.into_iter().map(|source| {
        let notifier = notifier.clone();
        async move {
            let result = run_source(config, registry, source, notifier).await;
            SourceOutcome {
                name: source.name.clone(),
                result,
            }
        }
    });
    Ok(join_all(runs).await)
}

/// Run one configured source.
pub async fn run_source(
    config: &Config,
    registry: &AdapterRegistry,
    source: &SourceConfig,
    notifier: Option<Arc<dyn Notifier>>,
) -> Result<RunReport> {
    utils::log::header(&format!("{} API Documentation Change Monitor", source.label()));

    let adapter = registry.get(&source.name)?;
    let storage = Arc::new(LocalStorage::new(config.state_path(source)));
    let ctx = FetchContext::new(&config.crawler)?;

    let mut monitor = Monitor::new(
        SourceContext::from_config(source),
        adapter,
        storage,
        RunOptions::from_config(config, source),
    );
    if let Some(notifier) = notifier {
        monitor = monitor.with_notifier(notifier);
    }

    let result = monitor.run(&ctx).await;
    match &result {
        Ok(report) => print_report(report),
        Err(e) => log::error!("{}: run failed: {}", source.name, e),
    }
    result
}

/// Log the change summary of one run.
pub fn print_report(report: &RunReport) {
    let changes = &report.changes;
    utils::log::summary(
        &format!("{} changes", report.source.display_name),
        &[
            ("Discovered", report.discovered.to_string()),
            ("New", changes.new_units.len().to_string()),
            ("Modified", changes.modified_units.len().to_string()),
            ("Deleted", changes.deleted_units.len().to_string()),
            ("Unchanged", changes.unchanged_count.to_string()),
            ("Failed", report.failed.len().to_string()),
        ],
    );

    for unit in &changes.new_units {
        utils::log::sub_item(&unit.format("+ {title} ({id})"));
    }
    for m in &changes.modified_units {
        utils::log::sub_item(&m.current.format("~ {title} ({id})"));
        utils::log::sub_item(&format!(
            "  {} -> {}",
            m.previous.fingerprint.short(16),
            m.current.fingerprint.short(16)
        ));
        if let Some((_, diff)) = report.content_diffs.iter().find(|(id, _)| *id == m.current.id) {
            for line in diff.lines() {
                utils::log::sub_item(&format!("    {line}"));
            }
        }
    }
    for unit in &changes.deleted_units {
        utils::log::sub_item(&unit.format("- {title} ({id})"));
    }
    for failed in &report.failed {
        log::warn!("  ! {} ({}): {}", failed.title, failed.id, failed.error);
    }

    if changes.is_empty() {
        log::info!("No changes detected");
    } else {
        log::warn!("Total changes: {}", changes.change_count());
    }
    log::info!("View full documentation at: {}", report.source.base_url);
}

/// Log the cross-source summary. Returns `true` when every source succeeded.
pub fn print_final_summary(outcomes: &[SourceOutcome]) -> bool {
    utils::log::header("FINAL SUMMARY");

    let mut total_changes = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let count = report.changes.change_count();
                total_changes += count;
                let status = if count == 0 {
                    "no changes".to_string()
                } else {
                    format!("{count} changes")
                };
                utils::log::sub_item(&format!("✓ {}: {}", outcome.name, status));
            }
            Err(e) => utils::log::sub_item(&format!("✗ {}: FAILED ({})", outcome.name, e)),
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    utils::log::summary(
        "Totals",
        &[
            ("Sources", outcomes.len().to_string()),
            ("Succeeded", (outcomes.len() - failed).to_string()),
            ("Failed", failed.to_string()),
            ("Changes", total_changes.to_string()),
        ],
    );
    failed == 0
}
