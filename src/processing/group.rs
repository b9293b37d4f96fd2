//! Group-by with row counts.

use std::collections::HashMap;

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Group rows by `keys` and count rows per group.
///
/// Output columns are the key columns followed by `count_column` (`Int64`). One row per
/// distinct key combination, sorted by key with nulls last. Null keys form their own group, so
/// the counts always sum to the input row count.
pub fn group_count(dataset: &DataSet, keys: &[&str], count_column: &str) -> EtlResult<DataSet> {
    let idxs = keys
        .iter()
        .map(|k| dataset.schema.require(k))
        .collect::<EtlResult<Vec<_>>>()?;

    let mut slots: HashMap<Vec<Option<String>>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, i64)> = Vec::new();
    for row in &dataset.rows {
        let key: Vec<Value> = idxs.iter().map(|&i| row[i].clone()).collect();
        let text_key: Vec<Option<String>> = key.iter().map(Value::text_key).collect();
        match slots.get(&text_key) {
            Some(&slot) => groups[slot].1 += 1,
            None => {
                slots.insert(text_key, groups.len());
                groups.push((key, 1));
            }
        }
    }

    groups.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut fields: Vec<Field> = idxs
        .iter()
        .map(|&i| dataset.schema.fields[i].clone())
        .collect();
    fields.push(Field::new(count_column, DataType::Int64));

    let rows = groups
        .into_iter()
        .map(|(mut key, count)| {
            key.push(Value::Int64(count));
            key
        })
        .collect();
    Ok(DataSet::new(Schema::new(fields), rows))
}

#[cfg(test)]
mod tests {
    use super::group_count;
    use crate::processing::{reduce, ReduceOp};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn stations() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("state", DataType::Utf8),
                Field::new("ev_connector_types", DataType::Utf8),
                Field::new("id", DataType::Int64),
            ]),
            vec![
                vec![Value::text("TX"), Value::text("J1772"), Value::Int64(1)],
                vec![Value::text("CA"), Value::text("TESLA"), Value::Int64(2)],
                vec![Value::text("TX"), Value::text("J1772"), Value::Int64(3)],
                vec![Value::text("TX"), Value::Null, Value::Int64(4)],
                vec![Value::text("CA"), Value::text("J1772"), Value::Int64(5)],
            ],
        )
    }

    #[test]
    fn counts_per_key_sorted() {
        let out = group_count(&stations(), &["state", "ev_connector_types"], "n").unwrap();
        assert_eq!(
            out.schema.field_names().collect::<Vec<_>>(),
            vec!["state", "ev_connector_types", "n"]
        );
        assert_eq!(
            out.rows,
            vec![
                vec![Value::text("CA"), Value::text("J1772"), Value::Int64(1)],
                vec![Value::text("CA"), Value::text("TESLA"), Value::Int64(1)],
                vec![Value::text("TX"), Value::text("J1772"), Value::Int64(2)],
                vec![Value::text("TX"), Value::Null, Value::Int64(1)],
            ]
        );
    }

    #[test]
    fn counts_partition_the_input() {
        let ds = stations();
        let out = group_count(&ds, &["ev_connector_types"], "n").unwrap();
        assert_eq!(
            reduce(&out, "n", ReduceOp::Sum),
            Some(Value::Int64(ds.row_count() as i64))
        );
    }

    #[test]
    fn empty_input_yields_empty_summary_with_schema() {
        let ds = DataSet::new(stations().schema, vec![]);
        let out = group_count(&ds, &["state"], "n").unwrap();
        assert_eq!(out.column_count(), 2);
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert!(group_count(&stations(), &["country"], "n").is_err());
    }
}
