//! Row filtering for [`crate::types::DataSet`].

use crate::error::EtlResult;
use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

/// Keep rows whose `column` satisfies `predicate`.
///
/// The column must exist.
pub fn filter_column<F>(dataset: &DataSet, column: &str, mut predicate: F) -> EtlResult<DataSet>
where
    F: FnMut(&Value) -> bool,
{
    let idx = dataset.schema.require(column)?;
    Ok(dataset.filter_rows(|row| predicate(&row[idx])))
}

/// Keep rows where every listed column is non-null.
pub fn drop_null_rows(dataset: &DataSet, columns: &[&str]) -> EtlResult<DataSet> {
    let idxs = columns
        .iter()
        .map(|c| dataset.schema.require(c))
        .collect::<EtlResult<Vec<_>>>()?;
    Ok(dataset.filter_rows(|row| idxs.iter().all(|&i| !row[i].is_null())))
}

/// Keep rows where `column` equals the string `expected`.
pub fn filter_eq(dataset: &DataSet, column: &str, expected: &str) -> EtlResult<DataSet> {
    filter_column(dataset, column, |v| v.as_str() == Some(expected))
}
