//! Outputs: CSV snapshots on disk and summary tables in the database.

pub mod csv;
pub mod loader;

pub use self::csv::{write_csv, write_csv_to};
pub use self::loader::{LoadOutcome, Loader, PostgresWriter, RowWriter, TableRows, TargetTable};
