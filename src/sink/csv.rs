use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::EtlResult;
use crate::types::{DataSet, Value};

/// Write `dataset` to `path` as CSV, replacing any existing file.
///
/// Parent directories are created. The header row is the schema's field names; cells use
/// [`Value::to_text`], so nulls become empty fields.
pub fn write_csv(dataset: &DataSet, path: &Path) -> EtlResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_csv_to(dataset, file)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "wrote csv snapshot"
    );
    Ok(())
}

/// Write `dataset` as CSV into any writer.
pub fn write_csv_to<W: Write>(dataset: &DataSet, writer: W) -> EtlResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(Value::to_text))?;
    }
    wtr.flush()?;
    Ok(())
}
