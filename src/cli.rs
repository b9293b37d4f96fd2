//! Command-line interface for the `vehicle-etl` binary.
//!
//! Exit codes: `0` on success, `1` when a fetch fails, and `2` for any other failure when
//! `--strict` is set (without it, such failures are logged and the exit code stays `0`).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, error, info};

use crate::config::{ComplaintQuery, EtlConfig, StationQuery};
use crate::error::{EtlError, EtlResult};
use crate::ingestion::{HttpSource, IngestionOptions, Source, TracingObserver};
use crate::pipeline::{run_complaints, run_stations, RunOptions, RunReport, TracingStepObserver};
use crate::sink::Loader;

/// Batch ETL for the NREL alternative-fuel station registry and NHTSA vehicle complaints.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vehicle-etl",
    version,
    about = "Fetch, clean, aggregate and load EV charging-station and vehicle-complaint data"
)]
pub struct Args {
    /// Root directory for CSV snapshots (overrides ETL_OUTPUT_DIR)
    #[arg(short = 'o', long = "output-dir", value_name = "PATH", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        global = true
    )]
    pub log_level: String,

    /// Write CSV snapshots but do not load the database
    #[arg(long = "skip-db", global = true)]
    pub skip_db: bool,

    /// Exit with code 2 when a non-fetch stage fails
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the alternative-fuel station pipeline
    Stations(StationArgs),
    /// Run the vehicle complaint pipeline
    Complaints(ComplaintArgs),
    /// Run both pipelines, stations first
    All {
        #[command(flatten)]
        stations: StationArgs,
        #[command(flatten)]
        complaints: ComplaintArgs,
    },
}

/// Station feed filters.
#[derive(Debug, Clone, ClapArgs)]
pub struct StationArgs {
    #[arg(long, default_value = "all")]
    pub access: String,
    #[arg(long = "fuel-type", default_value = "all")]
    pub fuel_type: String,
    #[arg(long, default_value = "all")]
    pub state: String,
}

impl StationArgs {
    pub fn to_query(&self) -> StationQuery {
        StationQuery {
            access: self.access.clone(),
            fuel_type: self.fuel_type.clone(),
            state: self.state.clone(),
        }
    }
}

/// Target vehicle for the complaint feed.
#[derive(Debug, Clone, ClapArgs)]
pub struct ComplaintArgs {
    #[arg(long, default_value = "JEEP")]
    pub make: String,
    #[arg(long, default_value = "WRANGLER")]
    pub model: String,
    #[arg(long = "model-year", default_value = "2021")]
    pub model_year: String,
}

impl ComplaintArgs {
    pub fn to_query(&self) -> ComplaintQuery {
        ComplaintQuery {
            make: self.make.clone(),
            model: self.model.clone(),
            model_year: self.model_year.clone(),
        }
    }
}

/// How a command ended, before `--strict` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    FetchFailed,
    Failed,
}

impl ExitStatus {
    pub fn code(self, strict: bool) -> i32 {
        match self {
            Self::Success => 0,
            Self::FetchFailed => 1,
            Self::Failed if strict => 2,
            Self::Failed => 0,
        }
    }

    fn from_error(err: &EtlError) -> Self {
        if err.is_fatal() { Self::FetchFailed } else { Self::Failed }
    }
}

/// Load configuration, build the HTTP source and loader, and run `args.command`.
pub fn run(args: &Args) -> i32 {
    let status = match prepare(args) {
        Ok((config, source)) => {
            let loader = if args.skip_db {
                info!("--skip-db set, database load disabled");
                Loader::disabled()
            } else {
                Loader::from_config(config.database.as_ref())
            };
            let run_date = chrono::Local::now().date_naive();
            execute(&args.command, &config, &source, &loader, &run_options(&config, run_date))
        }
        Err(e) => {
            error!(error = %e, "start-up failed");
            ExitStatus::from_error(&e)
        }
    };
    status.code(args.strict)
}

fn prepare(args: &Args) -> EtlResult<(EtlConfig, HttpSource)> {
    let mut config = EtlConfig::from_env()?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    debug!(config = %config.to_log_json(), "effective configuration");
    let source = HttpSource::new(config.http_timeout)?;
    Ok((config, source))
}

/// Run options wired to the tracing-backed observers.
pub fn run_options(config: &EtlConfig, run_date: NaiveDate) -> RunOptions {
    let mut options = RunOptions::new(config.output_dir.clone(), run_date);
    options.clean = options
        .clean
        .with_observer(std::sync::Arc::new(TracingStepObserver));
    options.ingestion = IngestionOptions {
        observer: Some(std::sync::Arc::new(TracingObserver)),
        ..IngestionOptions::default()
    };
    options
}

/// Run `command` against `source`, stopping at the first fetch failure.
pub fn execute(
    command: &Commands,
    config: &EtlConfig,
    source: &dyn Source,
    loader: &Loader,
    options: &RunOptions,
) -> ExitStatus {
    let stations = |args: &StationArgs| {
        run_stations(source, loader, &config.api_key, &args.to_query(), options)
    };
    let complaints = |args: &ComplaintArgs| run_complaints(source, loader, &args.to_query(), options);

    let results = match command {
        Commands::Stations(args) => vec![stations(args)],
        Commands::Complaints(args) => vec![complaints(args)],
        Commands::All {
            stations: s,
            complaints: c,
        } => {
            let first = stations(s);
            if first.as_ref().is_err_and(EtlError::is_fatal) {
                vec![first]
            } else {
                vec![first, complaints(c)]
            }
        }
    };

    let mut status = ExitStatus::Success;
    for result in results {
        match result {
            Ok(report) => {
                log_report(&report);
                if !report.load.succeeded() {
                    status = ExitStatus::Failed;
                }
            }
            Err(e) => {
                error!(error = %e, "pipeline failed");
                let this = ExitStatus::from_error(&e);
                if this == ExitStatus::FetchFailed {
                    return this;
                }
                status = this;
            }
        }
    }
    status
}

fn log_report(report: &RunReport) {
    info!(
        pipeline = %report.kind,
        canonical = %report.canonical_path.display(),
        summary = %report.summary_path.display(),
        load = ?report.load,
        "snapshots written"
    );
}
