//! `vehicle-data-etl` is a batch ETL for two public vehicle registries:
//!
//! - the NREL alternative-fuel station registry (`fuel_stations`), and
//! - the NHTSA vehicle complaint registry (`results`).
//!
//! Each run fetches one feed, materializes it into an in-memory [`types::DataSet`], applies a
//! fixed sequence of cleaning steps, counts records per group, writes both tables as CSV
//! snapshots and loads the summary into a SQL table.
//!
//! ## Running a pipeline
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use vehicle_data_etl::config::{EtlConfig, StationQuery};
//! use vehicle_data_etl::ingestion::HttpSource;
//! use vehicle_data_etl::pipeline::{run_stations, RunOptions};
//! use vehicle_data_etl::sink::Loader;
//!
//! # fn main() -> Result<(), vehicle_data_etl::EtlError> {
//! let config = EtlConfig::from_env()?;
//! let source = HttpSource::new(config.http_timeout)?;
//! let loader = Loader::from_config(config.database.as_ref());
//! let options = RunOptions::new(&config.output_dir, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//!
//! let report = run_stations(&source, &loader, &config.api_key, &StationQuery::default(), &options)?;
//! println!("{} connector groups", report.summary_rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Cleaning a table you already have
//!
//! ```rust
//! use chrono::NaiveDate;
//! use vehicle_data_etl::config::ComplaintQuery;
//! use vehicle_data_etl::ingestion::json::ingest_json_from_str;
//! use vehicle_data_etl::pipeline::{clean_complaints, CleanOptions};
//!
//! let raw = ingest_json_from_str(
//!     r#"{"results":[{"manufacturer":"FCA US LLC","components":"ENGINE, STEERING",
//!         "products":[{"productMake":"JEEP","productModel":"WRANGLER","productYear":"2021"}]}]}"#,
//!     "results",
//! )
//! .unwrap();
//! let options = CleanOptions::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//! let clean = clean_complaints(&raw, &ComplaintQuery::default(), &options).unwrap();
//! assert_eq!(clean.row_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: HTTP fetch and JSON materialization, with observer hooks
//! - [`processing`]: generic table transforms (filter, explode, unnest, group counts, ...)
//! - [`pipeline`]: the station and complaint cleaners, aggregators and end-to-end runs
//! - [`sink`]: CSV snapshots and the summary-table loader
//! - [`config`]: environment configuration and feed filters
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: the crate error type

pub mod cli;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod sink;
pub mod types;

pub use error::{EtlError, EtlResult};
