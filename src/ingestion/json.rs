//! JSON materialization.
//!
//! Upstream APIs answer with a JSON object whose designated array field holds one object per
//! record. [`ingest_json_records`] turns such an array into a [`DataSet`]: object keys become
//! columns (union of keys, first-seen order), missing keys become [`Value::Null`], nested
//! arrays and objects are kept as [`Value::List`] / [`Value::Struct`] cells.

use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Parse `input` and materialize the array stored under `array_field`.
pub fn ingest_json_from_str(input: &str, array_field: &str) -> EtlResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EtlError::schema_mismatch("json input is empty"));
    }
    let body: serde_json::Value = serde_json::from_str(trimmed)?;
    ingest_json_value(&body, array_field)
}

/// Materialize the array stored under `array_field` of an already decoded body.
pub fn ingest_json_value(body: &serde_json::Value, array_field: &str) -> EtlResult<DataSet> {
    ingest_json_records(extract_records(body, array_field)?)
}

/// Borrow the array stored under `array_field`.
pub fn extract_records<'a>(
    body: &'a serde_json::Value,
    array_field: &str,
) -> EtlResult<&'a [serde_json::Value]> {
    let obj = body
        .as_object()
        .ok_or_else(|| EtlError::schema_mismatch("json body is not an object"))?;
    let field = obj.get(array_field).ok_or_else(|| {
        EtlError::schema_mismatch(format!(
            "json body has no field '{array_field}'. keys={:?}",
            obj.keys().collect::<Vec<_>>()
        ))
    })?;
    field
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| EtlError::schema_mismatch(format!("field '{array_field}' is not an array")))
}

/// Turn an array of JSON objects into a [`DataSet`], inferring one column per key.
pub fn ingest_json_records(records: &[serde_json::Value]) -> EtlResult<DataSet> {
    let mut names: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());

    for (idx0, v) in records.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| {
            EtlError::schema_mismatch(format!("row {row_num} is not a json object"))
        })?;
        for k in obj.keys() {
            if !names.contains(k) {
                names.push(k.clone());
            }
        }
        objects.push(obj);
    }

    let rows: Vec<Vec<Value>> = objects
        .iter()
        .map(|obj| {
            names
                .iter()
                .map(|n| obj.get(n).map(Value::from_json).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    let fields = names
        .into_iter()
        .enumerate()
        .map(|(pos, name)| {
            let data_type = DataType::infer(rows.iter().map(|r| &r[pos]));
            Field::new(name, data_type)
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}
