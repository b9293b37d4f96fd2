//! End-to-end runs: fetch, clean, snapshot, aggregate, snapshot, load.
//!
//! Each run is strictly sequential. Only fetch errors are fatal
//! ([`crate::error::EtlError::is_fatal`]); load failures are logged by the [`Loader`] and
//! surface as [`LoadOutcome::Failed`] in the [`RunReport`].

pub mod complaints;
pub mod observer;
pub mod stations;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{ComplaintQuery, StationQuery};
use crate::error::EtlResult;
use crate::ingestion::{ingest_from_source, FetchRequest, IngestionOptions, Source};
use crate::sink::{write_csv, LoadOutcome, Loader};
use crate::types::DataSet;

pub use complaints::{clean_complaints, summarize_complaints};
pub use observer::{PipelineObserver, RecordingStepObserver, StepContext, StepStats, TracingStepObserver};
pub use stations::{clean_stations, summarize_stations};

/// The two feeds this crate knows how to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Stations,
    Complaints,
}

impl PipelineKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stations => "stations",
            Self::Complaints => "complaints",
        }
    }

    /// Logical dataset name of the summary, used to route it to its table.
    pub fn summary_dataset(self) -> &'static str {
        match self {
            Self::Stations => "alt_fuel_summary",
            Self::Complaints => "complaints_summary",
        }
    }

    /// `(canonical, summary)` snapshot paths under `output_dir`.
    pub fn snapshot_paths(self, output_dir: &Path) -> (PathBuf, PathBuf) {
        match self {
            Self::Stations => {
                let dir = output_dir.join("alternative");
                (dir.join("proc_alt_fuel_stations.csv"), dir.join("transf_alt_fuel.csv"))
            }
            Self::Complaints => {
                let dir = output_dir.join("complaints");
                (dir.join("proc_complaints.csv"), dir.join("trans_complaints.csv"))
            }
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options shared by the cleaners.
#[derive(Clone)]
pub struct CleanOptions {
    /// Snapshot date stamped on station rows.
    pub run_date: NaiveDate,
    /// Receives a callback after every step.
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl CleanOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for CleanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanOptions")
            .field("run_date", &self.run_date)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

/// Everything a run needs besides the source, the loader and the feed filters.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub clean: CleanOptions,
    pub ingestion: IngestionOptions,
}

impl RunOptions {
    pub fn new(output_dir: impl Into<PathBuf>, run_date: NaiveDate) -> Self {
        Self {
            output_dir: output_dir.into(),
            clean: CleanOptions::new(run_date),
            ingestion: IngestionOptions::default(),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub kind: PipelineKind,
    pub raw_rows: usize,
    pub canonical_rows: usize,
    pub summary_rows: usize,
    pub canonical_path: PathBuf,
    pub summary_path: PathBuf,
    pub load: LoadOutcome,
}

/// Run the alternative-fuel station pipeline.
pub fn run_stations(
    source: &dyn Source,
    loader: &Loader,
    api_key: &str,
    query: &StationQuery,
    options: &RunOptions,
) -> EtlResult<RunReport> {
    let request = FetchRequest::stations(api_key, query)?;
    run(PipelineKind::Stations, source, loader, &request, options, |raw| {
        let canonical = clean_stations(raw, &options.clean)?;
        let summary = summarize_stations(&canonical)?;
        Ok((canonical, summary))
    })
}

/// Run the vehicle complaint pipeline for the vehicle named by `query`.
pub fn run_complaints(
    source: &dyn Source,
    loader: &Loader,
    query: &ComplaintQuery,
    options: &RunOptions,
) -> EtlResult<RunReport> {
    let request = FetchRequest::complaints(query)?;
    run(PipelineKind::Complaints, source, loader, &request, options, |raw| {
        let canonical = clean_complaints(raw, query, &options.clean)?;
        let summary = summarize_complaints(&canonical, options.clean.run_date)?;
        Ok((canonical, summary))
    })
}

fn run<F>(
    kind: PipelineKind,
    source: &dyn Source,
    loader: &Loader,
    request: &FetchRequest,
    options: &RunOptions,
    transform: F,
) -> EtlResult<RunReport>
where
    F: FnOnce(&DataSet) -> EtlResult<(DataSet, DataSet)>,
{
    tracing::info!(pipeline = %kind, url = %request.redacted_url(), "fetching");
    let raw = ingest_from_source(source, request, &options.ingestion)?;

    let (canonical_path, summary_path) = kind.snapshot_paths(&options.output_dir);
    let (canonical, summary) = transform(&raw)?;
    write_csv(&canonical, &canonical_path)?;
    write_csv(&summary, &summary_path)?;

    let load = loader.load(&summary, kind.summary_dataset());
    tracing::info!(
        pipeline = %kind,
        raw_rows = raw.row_count(),
        canonical_rows = canonical.row_count(),
        summary_rows = summary.row_count(),
        "run finished"
    );

    Ok(RunReport {
        kind,
        raw_rows: raw.row_count(),
        canonical_rows: canonical.row_count(),
        summary_rows: summary.row_count(),
        canonical_path,
        summary_path,
        load,
    })
}
