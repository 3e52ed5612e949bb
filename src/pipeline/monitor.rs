// src/pipeline/monitor.rs

//! Change-detection run for a single source.
//!
//! load snapshot → discover → fetch/normalize/hash (bounded concurrency)
//! → diff → guard → notify → save snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{
    ChangeSet, Config, ContentUnit, NotifyPolicy, Snapshot, SourceConfig, UnitDescriptor,
};
use crate::notify::{Notifier, SourceContext};
use crate::pipeline::{
    CircuitBreaker, CircuitBreakerConfig, Differ, Normalizer, fingerprint, render_diff,
};
use crate::services::SourceAdapter;
use crate::storage::{PersistedSnapshot, SnapshotStorage};
use crate::utils::http::FetchContext;

/// Plain configuration values for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Keep extracted text in the snapshot
    pub save_content: bool,
    /// Deliver notifications at all
    pub notify_enabled: bool,
    /// Concurrent unit fetches
    pub max_concurrent: usize,
    /// Categories delivered to the notifier
    pub policy: NotifyPolicy,
    /// Unit-count drop guard
    pub guard: CircuitBreakerConfig,
    /// Lines of content diff kept per modified unit
    pub max_diff_lines: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            save_content: false,
            notify_enabled: true,
            max_concurrent: 4,
            policy: NotifyPolicy::default(),
            guard: CircuitBreakerConfig::default(),
            max_diff_lines: 40,
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &Config, source: &SourceConfig) -> Self {
        Self {
            save_content: config.storage.save_content,
            notify_enabled: config.notify.enabled,
            max_concurrent: config.crawler.max_concurrent.max(1),
            policy: source.notify_policy(&config.notify),
            guard: config.guard.clone(),
            ..Self::default()
        }
    }
}

/// A unit whose fetch failed this run.
#[derive(Debug, Clone)]
pub struct FailedFetch {
    pub id: String,
    pub title: String,
    pub error: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: SourceContext,
    /// Full classification, before notification filtering
    pub changes: ChangeSet,
    pub discovered: usize,
    pub failed: Vec<FailedFetch>,
    /// Line diffs of modified units, when content is retained
    pub content_diffs: Vec<(String, String)>,
    pub notified: bool,
    pub notify_error: Option<String>,
    pub first_run: bool,
    pub snapshot_location: String,
}

/// Runs change detection for one source.
pub struct Monitor {
    source: SourceContext,
    adapter: Arc<dyn SourceAdapter>,
    storage: Arc<dyn SnapshotStorage>,
    notifier: Option<Arc<dyn Notifier>>,
    options: RunOptions,
}

impl Monitor {
    pub fn new(
        source: SourceContext,
        adapter: Arc<dyn SourceAdapter>,
        storage: Arc<dyn SnapshotStorage>,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            adapter,
            storage,
            notifier: None,
            options,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load the previous snapshot; a missing file is the empty baseline.
    async fn load_previous(&self) -> Result<Snapshot> {
        let adapter = &self.adapter;
        Ok(self
            .storage
            .load_snapshot()
            .await?
            .map(|persisted| persisted.into_snapshot(|id| adapter.locate(id)))
            .unwrap_or_default())
    }

    /// Fetch, normalize and hash every discovered unit.
    ///
    /// Returns hashed units in discovery order and the failures.
    async fn hash_units(
        &self,
        ctx: &FetchContext,
        descriptors: Vec<UnitDescriptor>,
    ) -> (Vec<ContentUnit>, Vec<FailedFetch>) {
        let normalizer = Normalizer::with_patterns(self.adapter.volatile_patterns().to_vec());
        let adapter = &self.adapter;
        let total = descriptors.len();

        let mut results: Vec<_> = stream::iter(descriptors.into_iter().enumerate())
            .map(|(idx, descriptor)| async move {
                let result = adapter.fetch(ctx, &descriptor).await;
                (idx, descriptor, result)
            })
            .buffer_unordered(self.options.max_concurrent.max(1))
            .collect()
            .await;
        // Completion order is arbitrary; restore discovery order.
        results.sort_by_key(|(idx, _, _)| *idx);

        let mut units = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (idx, descriptor, result) in results {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("[{}/{}] {}: FAILED ({})", idx + 1, total, descriptor.title, e);
                    failed.push(FailedFetch {
                        id: descriptor.id,
                        title: descriptor.title,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let normalized = normalizer.normalize(&raw);
            if normalized.is_empty() {
                log::warn!("[{}/{}] {}: FAILED (empty content)", idx + 1, total, descriptor.title);
                failed.push(FailedFetch {
                    id: descriptor.id,
                    title: descriptor.title,
                    error: "empty content after normalization".to_string(),
                });
                continue;
            }

            let raw_content = self.options.save_content.then_some(raw);
            units.push(ContentUnit::from_descriptor(
                descriptor,
                fingerprint(&normalized),
                Utc::now(),
                raw_content,
            ));
        }
        (units, failed)
    }

    /// Execute one run.
    ///
    /// Discovery failures, corrupt state, guard trips and storage errors are
    /// returned as errors and leave the stored snapshot untouched. Unit fetch
    /// failures and notification failures are not fatal.
    pub async fn run(&self, ctx: &FetchContext) -> Result<RunReport> {
        let name = &self.source.name;

        let previous = self.load_previous().await?;
        let first_run = previous.is_baseline();
        if first_run {
            log::info!("{}: no previous snapshot, every unit will be new", name);
        } else {
            log::info!(
                "{}: previous check {} ({} units)",
                name,
                previous.taken_at.format("%Y-%m-%d %H:%M:%S UTC"),
                previous.len()
            );
        }

        let mut descriptors = self.adapter.discover(ctx).await?;
        let mut ids = HashSet::new();
        descriptors.retain(|d| ids.insert(d.id.clone()));
        let discovered = descriptors.len();
        log::info!("{}: discovered {} units", name, discovered);

        let (current, failed) = self.hash_units(ctx, descriptors).await;

        CircuitBreaker::with_config(self.options.guard.clone())
            .validate(current.len(), previous.len())?;

        let differ = Differ::new();
        let skipped: Vec<String> = failed.iter().map(|f| f.id.clone()).collect();
        let changes = differ.compare(&previous, &current, &skipped);

        let content_diffs = self.content_diffs(&changes);

        let mut notified = false;
        let mut notify_error = None;
        let deliverable = changes.filtered(&self.options.policy);
        if self.options.notify_enabled && !deliverable.is_empty() {
            if let Some(notifier) = &self.notifier {
                match notifier.send(&deliverable, &self.source).await {
                    Ok(()) => notified = true,
                    Err(e) => {
                        // State still advances; the alert is not retried.
                        log::error!("{}: notification failed: {}", name, e);
                        notify_error = Some(e.to_string());
                    }
                }
            }
        }

        let next = differ.next_snapshot(&previous, current, &changes, Utc::now());
        self.storage
            .save_snapshot(&PersistedSnapshot::from_snapshot(&next))
            .await?;
        log::info!("{}: snapshot saved to {}", name, self.storage.location());

        Ok(RunReport {
            source: self.source.clone(),
            changes,
            discovered,
            failed,
            content_diffs,
            notified,
            notify_error,
            first_run,
            snapshot_location: self.storage.location(),
        })
    }

    fn content_diffs(&self, changes: &ChangeSet) -> Vec<(String, String)> {
        if !self.options.save_content {
            return Vec::new();
        }
        changes
            .modified_units
            .iter()
            .filter_map(|m| {
                let old = m.previous.raw_content.as_deref()?;
                let new = m.current.raw_content.as_deref()?;
                Some((
                    m.current.id.clone(),
                    render_diff(old, new, self.options.max_diff_lines),
                ))
            })
            .collect()
    }
}
