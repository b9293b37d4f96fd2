//! Fetch entrypoint.
//!
//! Most callers should use [`ingest_from_source`], which fetches one [`FetchRequest`] through a
//! [`Source`] into an in-memory [`crate::types::DataSet`].
//!
//! - [`super::http::HttpSource`] is the production source; tests plug in fixtures.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::{ComplaintQuery, StationQuery};
use crate::error::{EtlError, EtlResult, Severity};
use crate::types::DataSet;

use super::observability::{IngestionContext, IngestionObserver, IngestionStats};

/// Alternative-fuel station registry endpoint.
pub const STATIONS_ENDPOINT: &str = "https://developer.nrel.gov/api/alt-fuel-stations/v1.json";

/// Vehicle complaint registry endpoint.
pub const COMPLAINTS_ENDPOINT: &str = "https://api.nhtsa.gov/complaints/complaintsByVehicle";

/// One fully parameterized request against an upstream registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Short name of the feed, used in logs.
    pub dataset: String,
    /// Endpoint including query string.
    pub url: Url,
    /// Name of the array field holding the records in the response body.
    pub array_field: String,
}

impl FetchRequest {
    pub fn new(dataset: impl Into<String>, url: Url, array_field: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            url,
            array_field: array_field.into(),
        }
    }

    /// Station feed request: `fuel_stations` array.
    pub fn stations(api_key: &str, query: &StationQuery) -> EtlResult<Self> {
        let url = Url::parse_with_params(
            STATIONS_ENDPOINT,
            &[
                ("api_key", api_key),
                ("access", query.access.as_str()),
                ("fuel_type", query.fuel_type.as_str()),
                ("state", query.state.as_str()),
            ],
        )
        .map_err(|e| EtlError::configuration(format!("invalid stations url: {e}")))?;
        Ok(Self::new("stations", url, "fuel_stations"))
    }

    /// Complaint feed request: `results` array.
    pub fn complaints(query: &ComplaintQuery) -> EtlResult<Self> {
        let url = Url::parse_with_params(
            COMPLAINTS_ENDPOINT,
            &[
                ("make", query.make.as_str()),
                ("model", query.model.as_str()),
                ("modelYear", query.model_year.as_str()),
            ],
        )
        .map_err(|e| EtlError::configuration(format!("invalid complaints url: {e}")))?;
        Ok(Self::new("complaints", url, "results"))
    }

    /// The URL with the `api_key` query value masked, safe for logs and error messages.
    pub fn redacted_url(&self) -> String {
        if !self.url.query_pairs().any(|(k, _)| k == "api_key") {
            return self.url.to_string();
        }
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == "api_key" { "***".to_string() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

/// Something that can answer a [`FetchRequest`] with a dataset.
pub trait Source {
    fn fetch(&self, request: &FetchRequest) -> EtlResult<DataSet>;
}

/// Options controlling [`ingest_from_source`].
#[derive(Clone)]
pub struct IngestionOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: Severity::Fatal,
        }
    }
}

/// Fetch `request` through `source`.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column stats
/// - `on_failure` on failure, with the error's [`Severity`]
/// - `on_alert` on failure when the severity is >= `options.alert_at_or_above`
pub fn ingest_from_source(
    source: &dyn Source,
    request: &FetchRequest,
    options: &IngestionOptions,
) -> EtlResult<DataSet> {
    let result = source.fetch(request);

    if let Some(obs) = options.observer.as_ref() {
        let ctx = IngestionContext {
            dataset: request.dataset.clone(),
            url: request.redacted_url(),
        };
        match &result {
            Ok(ds) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows: ds.row_count(),
                    columns: ds.column_count(),
                },
            ),
            Err(e) => {
                let sev = e.severity();
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}
