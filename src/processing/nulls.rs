//! Null analysis over whole columns.

use crate::types::DataSet;

/// Fraction of null cells in `column`.
///
/// Returns `None` when the column does not exist or the dataset has no rows.
pub fn null_fraction(dataset: &DataSet, column: &str) -> Option<f64> {
    let values = dataset.column(column)?;
    if dataset.row_count() == 0 {
        return None;
    }
    let nulls = values.filter(|v| v.is_null()).count();
    Some(nulls as f64 / dataset.row_count() as f64)
}

/// Drop every column whose null fraction is strictly greater than `threshold`.
///
/// An empty dataset drops nothing.
pub fn drop_sparse_columns(dataset: &DataSet, threshold: f64) -> DataSet {
    let keep: Vec<usize> = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| null_fraction(dataset, &f.name).is_none_or(|frac| frac <= threshold))
        .map(|(i, _)| i)
        .collect();
    dataset.select_indices(&keep)
}
