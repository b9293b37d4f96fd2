//! Blocking HTTP source for the upstream registries.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{EtlError, EtlResult};
use crate::types::DataSet;

use super::json::ingest_json_value;
use super::source::{FetchRequest, Source};

/// [`Source`] backed by a blocking `reqwest` client. One GET per request, no retries.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build a source whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> EtlResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| EtlError::Fetch {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl Source for HttpSource {
    fn fetch(&self, request: &FetchRequest) -> EtlResult<DataSet> {
        let url = request.url.as_str();
        debug!(url = %request.redacted_url(), "GET");

        // reqwest errors carry the full request url, api key included.
        let fetch_err = |source: reqwest::Error| EtlError::Fetch {
            url: request.redacted_url(),
            source: source.without_url(),
        };
        let resp = self.client.get(url).send().map_err(fetch_err)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EtlError::HttpStatus {
                url: request.redacted_url(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().map_err(fetch_err)?;
        ingest_json_value(&body, &request.array_field)
    }
}
