use thiserror::Error;

/// Convenience result type used across the crate.
pub type EtlResult<T> = Result<T, EtlError>;

/// How bad a failure is for the run that produced it.
///
/// Only fetch-stage failures abort a run; everything else is reported and the process still
/// exits normally (see [`EtlError::severity`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Non-fatal failure (cleaning, aggregation, persistence).
    Recoverable,
    /// Fetch-stage failure: the run must stop.
    Fatal,
}

/// Error type returned by every stage of the pipeline.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Transport failure or undecodable body while talking to an upstream API.
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream API answered with a non-2xx status.
    #[error("http status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Underlying I/O error (e.g. output directory not writable).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON payload could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The data does not have the shape a step expects (missing column, wrong payload, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be coerced into the type a step requires.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl EtlError {
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn parse(
        row: usize,
        column: impl Into<String>,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            row,
            column: column.into(),
            raw: raw.into(),
            message: message.into(),
        }
    }

    /// Classify the error into the two tiers the runner distinguishes.
    pub fn severity(&self) -> Severity {
        match self {
            EtlError::Fetch { .. } | EtlError::HttpStatus { .. } => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    /// `true` for fetch-stage failures that terminate the process with a non-zero code.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
