//! Flattening of nested object cells into top-level columns.

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Expand a struct column into one top-level column per nested key and drop the struct column.
///
/// - New columns are the union of nested keys in first-seen order, minus `exclude`.
/// - A nested key that already exists as a top-level column overrides it for rows whose object
///   carries that key; other rows keep their top-level value.
/// - Null cells (and non-object cells) contribute no fields.
pub fn unnest(dataset: &DataSet, column: &str, exclude: &[&str]) -> EtlResult<DataSet> {
    let idx = dataset.schema.require(column)?;

    let mut nested_keys: Vec<String> = Vec::new();
    for row in &dataset.rows {
        if let Value::Struct(pairs) = &row[idx] {
            for (k, _) in pairs {
                if !exclude.contains(&k.as_str()) && !nested_keys.contains(k) {
                    nested_keys.push(k.clone());
                }
            }
        }
    }

    let base = dataset.drop_columns(&[column]);
    let mut names: Vec<String> = base.schema.field_names().map(str::to_string).collect();
    for k in &nested_keys {
        if !names.contains(k) {
            names.push(k.clone());
        }
    }

    let rows: Vec<Vec<Value>> = dataset
        .rows
        .iter()
        .zip(&base.rows)
        .map(|(orig, flat)| {
            let mut out = flat.clone();
            out.resize(names.len(), Value::Null);
            if let Value::Struct(pairs) = &orig[idx] {
                for (k, v) in pairs {
                    if exclude.contains(&k.as_str()) {
                        continue;
                    }
                    if let Some(pos) = names.iter().position(|n| n == k) {
                        out[pos] = v.clone();
                    }
                }
            }
            out
        })
        .collect();

    let fields = names
        .iter()
        .enumerate()
        .map(|(pos, name)| Field::new(name.clone(), DataType::infer(rows.iter().map(|r| &r[pos]))))
        .collect();
    Ok(DataSet::new(Schema::new(fields), rows))
}

#[cfg(test)]
mod tests {
    use super::unnest;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn product(make: &str, model: &str) -> Value {
        Value::Struct(vec![
            ("type".to_string(), Value::text("VEHICLE")),
            ("productMake".to_string(), Value::text(make)),
            ("productModel".to_string(), Value::text(model)),
            ("manufacturer".to_string(), Value::text("FCA US LLC")),
            ("size".to_string(), Value::Null),
        ])
    }

    #[test]
    fn unnest_adds_nested_fields_and_drops_excluded() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("odiNumber", DataType::Int64),
                Field::new("manufacturer", DataType::Utf8),
                Field::new("products", DataType::Struct),
            ]),
            vec![
                vec![Value::Int64(1), Value::text("FCA"), product("JEEP", "WRANGLER")],
                vec![Value::Int64(2), Value::text("FCA"), Value::Null],
            ],
        );
        let out = unnest(&ds, "products", &["manufacturer", "size"]).unwrap();
        assert_eq!(
            out.schema.field_names().collect::<Vec<_>>(),
            vec!["odiNumber", "manufacturer", "type", "productMake", "productModel"]
        );
        assert_eq!(out.rows[0][1], Value::text("FCA"));
        assert_eq!(out.rows[0][3], Value::text("JEEP"));
        assert_eq!(out.rows[1][3], Value::Null);
    }

    #[test]
    fn nested_field_overrides_top_level_when_present() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("components", DataType::Utf8),
                Field::new("products", DataType::Struct),
            ]),
            vec![
                vec![
                    Value::text("ENGINE"),
                    Value::Struct(vec![("components".to_string(), Value::text("AIR BAGS"))]),
                ],
                vec![Value::text("ENGINE"), Value::Struct(vec![])],
            ],
        );
        let out = unnest(&ds, "products", &[]).unwrap();
        assert_eq!(out.column_count(), 1);
        assert_eq!(out.rows, vec![vec![Value::text("AIR BAGS")], vec![Value::text("ENGINE")]]);
    }
}
