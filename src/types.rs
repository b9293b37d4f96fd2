//! Core data model types.
//!
//! Fetched payloads are materialized into an in-memory [`DataSet`]: a [`Schema`] (a list of
//! typed [`Field`]s) plus row-major [`Value`] storage. Every transform in
//! [`crate::processing`] and [`crate::pipeline`] consumes a dataset and returns a new one.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{EtlError, EtlResult};

/// Render format for [`Value::Date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render format for [`Value::DateTime`].
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Calendar date without time zone.
    Date,
    /// Timestamp without time zone.
    DateTime,
    /// Ordered list of values (JSON array).
    List,
    /// Ordered key/value pairs (JSON object).
    Struct,
}

impl DataType {
    /// The type a single value carries, or `None` for [`Value::Null`].
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Int64(_) => Some(Self::Int64),
            Value::Float64(_) => Some(Self::Float64),
            Value::Bool(_) => Some(Self::Bool),
            Value::Utf8(_) => Some(Self::Utf8),
            Value::Date(_) => Some(Self::Date),
            Value::DateTime(_) => Some(Self::DateTime),
            Value::List(_) => Some(Self::List),
            Value::Struct(_) => Some(Self::Struct),
        }
    }

    /// Infer a column type from its values.
    ///
    /// Integers mixed with floats widen to [`DataType::Float64`]; all-null columns and any other
    /// mix fall back to [`DataType::Utf8`].
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut seen: Option<Self> = None;
        for v in values {
            let Some(t) = Self::of(v) else { continue };
            seen = match (seen, t) {
                (None, t) => Some(t),
                (Some(a), b) if a == b => Some(a),
                (Some(Self::Int64), Self::Float64) | (Some(Self::Float64), Self::Int64) => {
                    Some(Self::Float64)
                }
                _ => return Self::Utf8,
            };
        }
        seen.unwrap_or(Self::Utf8)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Like [`Schema::index_of`], but a missing field is a [`EtlError::SchemaMismatch`].
    pub fn require(&self, name: &str) -> EtlResult<usize> {
        self.index_of(name).ok_or_else(|| {
            EtlError::schema_mismatch(format!(
                "missing required column '{name}'. columns={:?}",
                self.field_names().collect::<Vec<_>>()
            ))
        })
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Naive timestamp.
    DateTime(NaiveDateTime),
    /// List of values, e.g. a multi-valued field before it is exploded.
    List(Vec<Value>),
    /// Nested object, keys kept in payload order.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Shorthand for `Value::Utf8(s.into())`.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Utf8(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a decoded JSON value.
    ///
    /// Integers that fit in `i64` stay integers; every other number becomes a float.
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Utf8(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Struct(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back into JSON. Dates render as strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Float64(v) => serde_json::Value::from(*v),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Utf8(s) => serde_json::Value::String(s.clone()),
            Value::Date(_) | Value::DateTime(_) => serde_json::Value::String(self.to_text()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Canonical text rendering, used for "compare as text" de-duplication, group keys and CSV
    /// output. `Null` renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Utf8(s) => s.clone(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::List(_) | Value::Struct(_) => self.to_json().to_string(),
        }
    }

    /// Text rendering that keeps `Null` distinct from an empty string.
    pub fn text_key(&self) -> Option<String> {
        if self.is_null() { None } else { Some(self.to_text()) }
    }

    /// Total order used to sort group keys: numbers numerically, dates chronologically,
    /// strings lexicographically, nulls last.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                x.total_cmp(&y)
            }
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (a, b) => a
                .type_rank()
                .cmp(&b.type_rank())
                .then_with(|| a.to_text().cmp(&b.to_text())),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int64(_) | Value::Float64(_) => 1,
            Value::Date(_) => 2,
            Value::DateTime(_) => 3,
            Value::Utf8(_) => 4,
            Value::List(_) => 5,
            Value::Struct(_) => 6,
            Value::Null => 7,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Borrow the values of one column, or `None` if it does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Value at `(row, column)`; `None` if either is out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset by applying `mapper` to every row.
    ///
    /// The returned dataset preserves the original schema.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the schema field count.
    pub fn map_rows<F>(&self, mut mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        let expected_len = self.schema.fields.len();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let out = mapper(row.as_slice());
                assert!(
                    out.len() == expected_len,
                    "mapped row length {} does not match schema length {}",
                    out.len(),
                    expected_len
                );
                out
            })
            .collect();

        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Reduce (fold) all rows into an accumulator value.
    ///
    /// This is similar to `Iterator::fold`, but provides each row as `&[Value]`.
    pub fn reduce_rows<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &[Value]) -> A,
    {
        self.rows
            .iter()
            .fold(init, |acc, row| reducer(acc, row.as_slice()))
    }

    /// Remove the named columns. Names that are not present are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Self {
        let keep: Vec<usize> = self
            .schema
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !names.contains(&f.name.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.select_indices(&keep)
    }

    /// Keep only the columns at `indices`, in that order.
    pub fn select_indices(&self, indices: &[usize]) -> Self {
        let fields = indices
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self::new(Schema::new(fields), rows)
    }

    /// Replace the column `field.name` with `values`, or append it if absent.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn with_column(&self, field: Field, values: Vec<Value>) -> Self {
        assert!(
            values.len() == self.rows.len(),
            "column length {} does not match row count {}",
            values.len(),
            self.rows.len()
        );
        let mut out = self.clone();
        match out.schema.index_of(&field.name) {
            Some(idx) => {
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
                out.schema.fields[idx] = field;
            }
            None => {
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row.push(v);
                }
                out.schema.fields.push(field);
            }
        }
        out
    }

    /// Rewrite one column value-by-value.
    ///
    /// A missing column is materialized (every cell starts as [`Value::Null`]) and appended.
    /// `mapper` receives the zero-based row index and the current value.
    pub fn try_map_column<F>(&self, name: &str, data_type: DataType, mut mapper: F) -> EtlResult<Self>
    where
        F: FnMut(usize, &Value) -> EtlResult<Value>,
    {
        let idx = self.schema.index_of(name);
        let values = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| match idx {
                Some(idx) => mapper(i, &row[idx]),
                None => mapper(i, &Value::Null),
            })
            .collect::<EtlResult<Vec<_>>>()?;
        Ok(self.with_column(Field::new(name, data_type), values))
    }

    /// Infallible variant of [`DataSet::try_map_column`].
    pub fn map_column<F>(&self, name: &str, data_type: DataType, mut mapper: F) -> Self
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.schema.index_of(name);
        let values = self
            .rows
            .iter()
            .map(|row| match idx {
                Some(idx) => mapper(&row[idx]),
                None => mapper(&Value::Null),
            })
            .collect();
        self.with_column(Field::new(name, data_type), values)
    }
}
