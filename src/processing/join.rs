//! Lookup tables and left joins against them.

use std::collections::HashMap;

use crate::error::EtlResult;
use crate::types::{DataSet, Value};

/// A `key -> value` mapping built from two columns of a dataset.
///
/// Keys are compared by their text rendering; a null key is a valid key of its own.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    entries: HashMap<Option<String>, Value>,
}

impl Lookup {
    /// Build a lookup from `(key_column, value_column)`, keeping the first row seen for each
    /// distinct key (the value may itself be null).
    pub fn first_by_key(dataset: &DataSet, key_column: &str, value_column: &str) -> EtlResult<Self> {
        let key_idx = dataset.schema.require(key_column)?;
        let value_idx = dataset.schema.require(value_column)?;
        let mut entries = HashMap::new();
        for row in &dataset.rows {
            entries
                .entry(row[key_idx].text_key())
                .or_insert_with(|| row[value_idx].clone());
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&key.text_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Left-join `lookup` on `key_column` and overwrite `target_column` in place with the looked-up
/// value. Rows whose key is not in the lookup get [`Value::Null`].
///
/// Because the lookup holds at most one value per key, the row count never changes.
pub fn left_join_replace(
    dataset: &DataSet,
    key_column: &str,
    target_column: &str,
    lookup: &Lookup,
) -> EtlResult<DataSet> {
    let key_idx = dataset.schema.require(key_column)?;
    let target_idx = dataset.schema.require(target_column)?;
    Ok(dataset.map_rows(|row| {
        let mut r = row.to_vec();
        r[target_idx] = lookup.get(&row[key_idx]).cloned().unwrap_or(Value::Null);
        r
    }))
}
