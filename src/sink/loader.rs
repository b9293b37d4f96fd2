//! Summary-table loader.
//!
//! [`Loader::load`] picks the destination table from the logical dataset name, projects the
//! summary onto that table's columns and hands the rows to a [`RowWriter`]. Any failure is
//! logged and reported as [`LoadOutcome::Failed`]; it never aborts the run.

use sqlx::postgres::{PgArguments, PgConnectOptions};
use sqlx::query::Query;
use sqlx::{ConnectOptions, Connection, Postgres};

use crate::config::DatabaseConfig;
use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, DataType, Value};

/// Destination table of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTable {
    Complaints,
    AlternativeFuel,
}

impl TargetTable {
    /// Any dataset name containing `"complaints"` goes to the complaints table.
    pub fn for_dataset(name: &str) -> Self {
        if name.contains("complaints") {
            Self::Complaints
        } else {
            Self::AlternativeFuel
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Complaints => "complaints",
            Self::AlternativeFuel => "alternativeFuel",
        }
    }

    /// Insert order of the table's columns.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Complaints => &[
                "manufacturer",
                "productMake",
                "productModel",
                "productYear",
                "components",
                "numComplaints",
                "dateExtraction",
            ],
            Self::AlternativeFuel => &[
                "monthYearHistory",
                "fuel_type_code",
                "country",
                "state",
                "city",
                "ev_connector_types",
                "numDifConnectors",
            ],
        }
    }

    /// Positional-parameter insert for one row.
    pub fn insert_sql(self) -> String {
        let columns = self
            .columns()
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let params = (1..=self.columns().len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO \"{}\" ({columns}) VALUES ({params})",
            self.table_name()
        )
    }
}

/// Rows already projected onto a table's columns, with each column's type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRows {
    pub table: TargetTable,
    pub types: Vec<DataType>,
    pub rows: Vec<Vec<Value>>,
}

impl TableRows {
    /// Project `summary` onto `table`'s columns. A missing column is a schema mismatch.
    pub fn project(summary: &DataSet, table: TargetTable) -> EtlResult<Self> {
        let idxs = table
            .columns()
            .iter()
            .map(|c| summary.schema.require(c))
            .collect::<EtlResult<Vec<_>>>()?;
        Ok(Self {
            table,
            types: idxs.iter().map(|&i| summary.schema.fields[i].data_type).collect(),
            rows: summary
                .rows
                .iter()
                .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }
}

/// Persists projected rows. Implementations must write all rows or none.
pub trait RowWriter {
    /// Returns the number of rows written.
    fn write_rows(&self, rows: &TableRows) -> EtlResult<usize>;
}

/// Writes rows into PostgreSQL, one `INSERT` per row inside a single transaction.
///
/// A connection is opened per call on a current-thread runtime and closed afterwards.
#[derive(Debug, Clone)]
pub struct PostgresWriter {
    config: DatabaseConfig,
}

impl PostgresWriter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.username)
            .password(&self.config.password)
            .database(&self.config.database)
    }
}

impl RowWriter for PostgresWriter {
    fn write_rows(&self, rows: &TableRows) -> EtlResult<usize> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let sql = rows.table.insert_sql();

        runtime.block_on(async {
            let mut conn = self.connect_options().connect().await?;
            let mut tx = conn.begin().await?;
            for row in &rows.rows {
                let mut query = sqlx::query(&sql);
                for (value, data_type) in row.iter().zip(&rows.types) {
                    query = bind_value(query, value, *data_type);
                }
                query.execute(&mut *tx).await?;
            }
            tx.commit().await?;
            conn.close().await?;
            Ok::<_, EtlError>(rows.rows.len())
        })
    }
}

/// Nulls are bound with the column's type so the server accepts them for any column.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
    data_type: DataType,
) -> Query<'q, Postgres, PgArguments> {
    match (value, data_type) {
        (Value::Null, DataType::Int64) => query.bind(None::<i64>),
        (Value::Null, DataType::Float64) => query.bind(None::<f64>),
        (Value::Null, DataType::Bool) => query.bind(None::<bool>),
        (Value::Null, DataType::Date) => query.bind(None::<chrono::NaiveDate>),
        (Value::Null, DataType::DateTime) => query.bind(None::<chrono::NaiveDateTime>),
        (Value::Null, _) => query.bind(None::<String>),
        (Value::Int64(v), _) => query.bind(*v),
        (Value::Float64(v), _) => query.bind(*v),
        (Value::Bool(v), _) => query.bind(*v),
        (Value::Date(v), _) => query.bind(*v),
        (Value::DateTime(v), _) => query.bind(*v),
        (Value::Utf8(s), _) => query.bind(s.clone()),
        (other, _) => query.bind(other.to_text()),
    }
}

/// Result of a [`Loader::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows written and committed.
    Loaded(usize),
    /// No database configured.
    Skipped,
    /// The load failed; the error has been logged.
    Failed,
}

impl LoadOutcome {
    /// `false` only for [`LoadOutcome::Failed`].
    pub fn succeeded(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Dispatches summaries to their table through an optional [`RowWriter`].
pub struct Loader {
    writer: Option<Box<dyn RowWriter>>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("enabled", &self.writer.is_some())
            .finish()
    }
}

impl Loader {
    pub fn new(writer: Box<dyn RowWriter>) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// A loader that skips every load.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Loader for an optional database; `None` disables loading.
    pub fn from_config(config: Option<&DatabaseConfig>) -> Self {
        match config {
            Some(db) => Self::new(Box::new(PostgresWriter::new(db.clone()))),
            None => Self::disabled(),
        }
    }

    /// Load `summary` into the table selected by `dataset_name`.
    pub fn load(&self, summary: &DataSet, dataset_name: &str) -> LoadOutcome {
        let table = TargetTable::for_dataset(dataset_name);
        let Some(writer) = self.writer.as_deref() else {
            tracing::info!(dataset = dataset_name, table = table.table_name(), "no database configured, skipping load");
            return LoadOutcome::Skipped;
        };

        let result = TableRows::project(summary, table).and_then(|rows| writer.write_rows(&rows));
        match result {
            Ok(n) => {
                tracing::info!(dataset = dataset_name, table = table.table_name(), rows = n, "loaded summary");
                LoadOutcome::Loaded(n)
            }
            Err(e) => {
                tracing::error!(dataset = dataset_name, table = table.table_name(), error = %e, "load failed");
                LoadOutcome::Failed
            }
        }
    }
}
