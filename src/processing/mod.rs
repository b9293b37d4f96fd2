//! In-memory data transformations.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion.
//! Every function returns a new dataset and leaves its input untouched. The cleaners in
//! [`crate::pipeline`] are ordered compositions of these building blocks.
//!
//! - [`filter()`], [`filter_eq`], [`drop_null_rows`]: row filtering
//! - [`map()`], [`fill_null`]: row and cell rewriting
//! - [`reduce()`], [`quantile`]: column reductions
//! - [`drop_duplicates`]: exact de-duplication comparing rows as text
//! - [`null_fraction`], [`drop_sparse_columns`]: null analysis
//! - [`explode`], [`split_explode`]: one row per element of multi-valued cells
//! - [`Lookup`], [`left_join_replace`]: lookup-table joins
//! - [`unnest`]: nested objects to top-level columns
//! - [`group_count`]: group-by with counts
//!
//! ## Example: explode → filter → group
//!
//! ```rust
//! use vehicle_data_etl::processing::{explode, filter_eq, group_count};
//! use vehicle_data_etl::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("fuel_type_code", DataType::Utf8),
//!         Field::new("ev_connector_types", DataType::List),
//!     ]),
//!     vec![
//!         vec![Value::text("ELEC"), Value::List(vec![Value::text("J1772"), Value::text("TESLA")])],
//!         vec![Value::text("CNG"), Value::Null],
//!         vec![Value::text("ELEC"), Value::List(vec![Value::text("J1772")])],
//!     ],
//! );
//!
//! let exploded = explode(&ds, "ev_connector_types").unwrap();
//! let elec = filter_eq(&exploded, "fuel_type_code", "ELEC").unwrap();
//! let summary = group_count(&elec, &["ev_connector_types"], "n").unwrap();
//!
//! assert_eq!(summary.rows[0], vec![Value::text("J1772"), Value::Int64(2)]);
//! assert_eq!(summary.rows[1], vec![Value::text("TESLA"), Value::Int64(1)]);
//! ```

pub mod dedup;
pub mod explode;
pub mod filter;
pub mod group;
pub mod join;
pub mod map;
pub mod nulls;
pub mod reduce;
pub mod unnest;

pub use dedup::drop_duplicates;
pub use explode::{explode, split_explode};
pub use filter::{drop_null_rows, filter, filter_column, filter_eq};
pub use group::group_count;
pub use join::{left_join_replace, Lookup};
pub use map::{fill_null, map};
pub use nulls::{drop_sparse_columns, null_fraction};
pub use reduce::{quantile, reduce, ReduceOp};
pub use unnest::unnest;
