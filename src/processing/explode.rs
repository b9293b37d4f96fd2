//! Row expansion: one output row per element of a multi-valued cell.

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Value};

/// Explode a list column into one row per element.
///
/// - An empty list yields a single row with [`Value::Null`].
/// - Scalars and nulls pass through unchanged.
///
/// The column type becomes the inferred type of the exploded elements.
pub fn explode(dataset: &DataSet, column: &str) -> EtlResult<DataSet> {
    let idx = dataset.schema.require(column)?;
    let mut out = DataSet::new(dataset.schema.clone(), Vec::with_capacity(dataset.row_count()));

    for row in &dataset.rows {
        match &row[idx] {
            Value::List(items) if items.is_empty() => {
                let mut r = row.clone();
                r[idx] = Value::Null;
                out.rows.push(r);
            }
            Value::List(items) => {
                for item in items {
                    let mut r = row.clone();
                    r[idx] = item.clone();
                    out.rows.push(r);
                }
            }
            _ => out.rows.push(row.clone()),
        }
    }

    out.schema.fields[idx].data_type = DataType::infer(out.rows.iter().map(|r| &r[idx]));
    Ok(out)
}

/// Split a string column on `delimiter`, trim each piece, and emit one row per piece.
///
/// Nulls pass through unchanged; non-string values are split on their text rendering.
pub fn split_explode(dataset: &DataSet, column: &str, delimiter: char) -> EtlResult<DataSet> {
    let idx = dataset.schema.require(column)?;
    let split = dataset.map_rows(|row| {
        let mut r = row.to_vec();
        if !r[idx].is_null() {
            let pieces = r[idx]
                .to_text()
                .split(delimiter)
                .map(|p| Value::text(p.trim()))
                .collect();
            r[idx] = Value::List(pieces);
        }
        r
    });
    let mut out = explode(&split, column)?;
    out.schema.fields[idx].data_type = DataType::Utf8;
    Ok(out)
}
