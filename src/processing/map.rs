//! Row mapping for [`crate::types::DataSet`].

use crate::types::{DataSet, DataType, Value};

/// Returns a new [`DataSet`] by applying `mapper` to every row.
///
/// This is a convenience wrapper around [`DataSet::map_rows`].
///
/// # Panics
///
/// Panics if `mapper` returns rows with a different length than the schema field count.
pub fn map<F>(dataset: &DataSet, mapper: F) -> DataSet
where
    F: FnMut(&[Value]) -> Vec<Value>,
{
    dataset.map_rows(mapper)
}

/// Replace nulls in `column` with `fill`. A missing column is created filled with `fill`.
pub fn fill_null(dataset: &DataSet, column: &str, fill: Value) -> DataSet {
    let data_type = match dataset.schema.index_of(column) {
        Some(idx) => {
            let current = dataset.schema.fields[idx].data_type;
            if dataset.column(column).into_iter().flatten().all(Value::is_null) {
                DataType::of(&fill).unwrap_or(current)
            } else {
                current
            }
        }
        None => DataType::of(&fill).unwrap_or(DataType::Utf8),
    };
    dataset.map_column(column, data_type, |v| {
        if v.is_null() { fill.clone() } else { v.clone() }
    })
}
