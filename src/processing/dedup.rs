//! Exact duplicate removal.

use std::collections::HashSet;

use crate::types::DataSet;

/// Drop rows that are identical to an earlier row when every column is compared as text.
///
/// The first occurrence is kept and row order is preserved. A null cell and an empty string
/// compare as different.
pub fn drop_duplicates(dataset: &DataSet) -> DataSet {
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(dataset.row_count());
    dataset.filter_rows(|row| seen.insert(row.iter().map(|v| v.text_key()).collect()))
}
