//! Reduction operations for [`crate::types::DataSet`].

use crate::types::{DataSet, DataType, Value};

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
}

/// Reduce a column using a built-in [`ReduceOp`].
///
/// - Returns `None` if `column` does not exist in the schema.
/// - For `Sum`/`Min`/`Max`, returns `Some(Value::Null)` if there are no non-null values.
/// - For `Count`, always returns `Some(Value::Int64(row_count))`.
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> Option<Value> {
    let idx = dataset.schema.index_of(column)?;

    match op {
        ReduceOp::Count => Some(Value::Int64(dataset.row_count() as i64)),
        ReduceOp::Sum | ReduceOp::Min | ReduceOp::Max => {
            let data_type = dataset.schema.fields[idx].data_type;
            Some(reduce_numeric_typed(dataset, idx, data_type, op))
        }
    }
}

fn reduce_numeric_typed(dataset: &DataSet, idx: usize, data_type: DataType, op: ReduceOp) -> Value {
    match data_type {
        DataType::Int64 => {
            let acc = dataset.reduce_rows(None::<i64>, |acc, row| match &row[idx] {
                Value::Int64(v) => Some(combine(op, acc, *v, i64::min, i64::max)),
                _ => acc,
            });
            acc.map(Value::Int64).unwrap_or(Value::Null)
        }
        DataType::Float64 => {
            let acc = dataset.reduce_rows(None::<f64>, |acc, row| match row[idx].as_f64() {
                Some(v) => Some(combine(op, acc, v, f64::min, f64::max)),
                None => acc,
            });
            acc.map(Value::Float64).unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn combine<T>(op: ReduceOp, acc: Option<T>, v: T, min: fn(T, T) -> T, max: fn(T, T) -> T) -> T
where
    T: std::ops::Add<Output = T> + Copy,
{
    match (op, acc) {
        (_, None) => v,
        (ReduceOp::Sum, Some(a)) => a + v,
        (ReduceOp::Min, Some(a)) => min(a, v),
        (ReduceOp::Max, Some(a)) => max(a, v),
        (ReduceOp::Count, Some(a)) => a,
    }
}

/// Quantile of the numeric values of `column`, using linear interpolation between the two
/// nearest ranks. Nulls and non-numeric values are ignored.
///
/// Returns `None` if the column is missing or holds no numeric values.
pub fn quantile(dataset: &DataSet, column: &str, q: f64) -> Option<f64> {
    let mut values: Vec<f64> = dataset.column(column)?.filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::{quantile, reduce, ReduceOp};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn numeric_dataset_with_nulls() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("score", DataType::Float64),
        ]);

        let rows = vec![
            vec![Value::Int64(1), Value::Float64(10.0)],
            vec![Value::Int64(2), Value::Null],
            vec![Value::Int64(3), Value::Float64(5.5)],
        ];

        DataSet::new(schema, rows)
    }

    fn evse(values: &[i64]) -> DataSet {
        DataSet::new(
            Schema::new(vec![Field::new("ev_level2_evse_num", DataType::Int64)]),
            values.iter().map(|v| vec![Value::Int64(*v)]).collect(),
        )
    }

    #[test]
    fn reduce_count_counts_rows() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "score", ReduceOp::Count), Some(Value::Int64(3)));
        assert_eq!(reduce(&ds, "id", ReduceOp::Count), Some(Value::Int64(3)));
    }

    #[test]
    fn reduce_sum_ignores_nulls_and_preserves_type() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "score", ReduceOp::Sum), Some(Value::Float64(15.5)));
        assert_eq!(reduce(&ds, "id", ReduceOp::Sum), Some(Value::Int64(6)));
    }

    #[test]
    fn reduce_min_max_ignore_nulls() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "score", ReduceOp::Min), Some(Value::Float64(5.5)));
        assert_eq!(reduce(&ds, "score", ReduceOp::Max), Some(Value::Float64(10.0)));
        assert_eq!(reduce(&ds, "id", ReduceOp::Min), Some(Value::Int64(1)));
        assert_eq!(reduce(&ds, "id", ReduceOp::Max), Some(Value::Int64(3)));
    }

    #[test]
    fn reduce_returns_none_for_missing_column() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "missing", ReduceOp::Count), None);
        assert_eq!(reduce(&ds, "missing", ReduceOp::Sum), None);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        // pos = 0.75 * 3 = 2.25 -> 8 + 0.25 * (12 - 8)
        assert_eq!(quantile(&evse(&[12, 0, 8, 4]), "ev_level2_evse_num", 0.75), Some(9.0));
        assert_eq!(quantile(&evse(&[3]), "ev_level2_evse_num", 0.75), Some(3.0));
        assert_eq!(quantile(&evse(&[1, 2, 3, 4, 5]), "ev_level2_evse_num", 0.5), Some(3.0));
    }

    #[test]
    fn quantile_of_empty_or_missing_column_is_none() {
        assert_eq!(quantile(&evse(&[]), "ev_level2_evse_num", 0.75), None);
        assert_eq!(quantile(&evse(&[1]), "other", 0.75), None);
    }
}
