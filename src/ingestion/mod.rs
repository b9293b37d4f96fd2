//! Fetching and materialization of upstream payloads.
//!
//! Most callers should use [`ingest_from_source`] (from [`source`]) which:
//!
//! - sends one [`FetchRequest`] through a [`Source`] (usually [`HttpSource`])
//! - materializes the response's record array into an in-memory [`crate::types::DataSet`]
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! JSON materialization on its own lives in [`json`].

pub mod http;
pub mod json;
pub mod observability;
pub mod source;

pub use http::HttpSource;
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionStats, TracingObserver,
};
pub use source::{
    ingest_from_source, FetchRequest, IngestionOptions, Source, COMPLAINTS_ENDPOINT, STATIONS_ENDPOINT,
};
