use std::sync::Mutex;

use crate::types::DataSet;

/// Identifies one cleaning/aggregation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext<'a> {
    /// `"stations"` or `"complaints"`.
    pub pipeline: &'a str,
    /// Step name, e.g. `"drop_sparse_columns"`.
    pub step: &'a str,
    /// One-based position of the step in its pipeline.
    pub index: usize,
}

/// Shape of the table right after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub rows: usize,
    pub columns: usize,
}

/// Observer hook called after every step of a cleaner.
pub trait PipelineObserver: Send + Sync {
    fn on_step(&self, ctx: &StepContext<'_>, stats: StepStats);
}

/// Logs every step at debug level.
#[derive(Debug, Default)]
pub struct TracingStepObserver;

impl PipelineObserver for TracingStepObserver {
    fn on_step(&self, ctx: &StepContext<'_>, stats: StepStats) {
        tracing::debug!(
            pipeline = ctx.pipeline,
            step = ctx.step,
            index = ctx.index,
            rows = stats.rows,
            columns = stats.columns,
            "step finished"
        );
    }
}

/// Keeps every step event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingStepObserver {
    events: Mutex<Vec<(String, usize, StepStats)>>,
}

impl RecordingStepObserver {
    /// `(step name, index, stats)` for every step seen so far.
    pub fn events(&self) -> Vec<(String, usize, StepStats)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl PipelineObserver for RecordingStepObserver {
    fn on_step(&self, ctx: &StepContext<'_>, stats: StepStats) {
        if let Ok(mut events) = self.events.lock() {
            events.push((ctx.step.to_string(), ctx.index, stats));
        }
    }
}

/// Numbers steps and forwards them to an optional observer.
pub(crate) struct StepTracker<'a> {
    pipeline: &'static str,
    observer: Option<&'a dyn PipelineObserver>,
    index: usize,
}

impl<'a> StepTracker<'a> {
    pub(crate) fn new(pipeline: &'static str, observer: Option<&'a dyn PipelineObserver>) -> Self {
        Self {
            pipeline,
            observer,
            index: 0,
        }
    }

    /// Report `ds` as the output of `step` and hand it back.
    pub(crate) fn record(&mut self, step: &'static str, ds: DataSet) -> DataSet {
        self.index += 1;
        if let Some(obs) = self.observer {
            obs.on_step(
                &StepContext {
                    pipeline: self.pipeline,
                    step,
                    index: self.index,
                },
                StepStats {
                    rows: ds.row_count(),
                    columns: ds.column_count(),
                },
            );
        }
        ds
    }
}
