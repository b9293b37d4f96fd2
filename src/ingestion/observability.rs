use std::fmt;
use std::sync::Arc;

use crate::error::{EtlError, Severity};

/// Context about a fetch attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Short name of the feed (e.g. `"stations"`).
    pub dataset: String,
    /// Endpoint that was requested, with secrets redacted.
    pub url: String,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of ingested rows.
    pub rows: usize,
    /// Number of inferred columns.
    pub columns: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: Severity, _error: &EtlError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &EtlError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: Severity, error: &EtlError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &EtlError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Reports ingestion events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            dataset = %ctx.dataset,
            url = %ctx.url,
            rows = stats.rows,
            columns = stats.columns,
            "fetched dataset"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: Severity, error: &EtlError) {
        tracing::warn!(
            dataset = %ctx.dataset,
            url = %ctx.url,
            ?severity,
            error = %error,
            "fetch failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &EtlError) {
        tracing::error!(
            dataset = %ctx.dataset,
            url = %ctx.url,
            ?severity,
            error = %error,
            "fetch failed, aborting run"
        );
    }
}
