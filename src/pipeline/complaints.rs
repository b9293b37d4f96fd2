//! Vehicle complaint cleaner and aggregator.

use chrono::NaiveDate;

use crate::config::ComplaintQuery;
use crate::error::{EtlError, EtlResult};
use crate::processing::{drop_null_rows, explode, filter, group_count, split_explode, unnest};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::observer::StepTracker;
use super::CleanOptions;

/// Date format used by the complaint feed.
pub const COMPLAINT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Product fields that duplicate complaint-level data and are not carried over.
pub const EXCLUDED_PRODUCT_FIELDS: [&str; 2] = ["manufacturer", "size"];

/// Group key of the complaint summary table.
pub const SUMMARY_KEYS: [&str; 5] = [
    "manufacturer",
    "productMake",
    "productModel",
    "productYear",
    "components",
];

/// Count column of the complaint summary table.
pub const SUMMARY_COUNT_COLUMN: &str = "numComplaints";

/// Extraction date column appended to the summary.
pub const EXTRACTION_DATE_COLUMN: &str = "dateExtraction";

const DATE_COLUMNS: [&str; 2] = ["dateComplaintFiled", "dateOfIncident"];

/// Run the complaint cleaner on a raw `results` table, keeping only `target`.
///
/// A vehicle with no complaints is a valid reply: it yields an empty table with the group-key
/// and date columns, and no steps are reported.
pub fn clean_complaints(
    raw: &DataSet,
    target: &ComplaintQuery,
    options: &CleanOptions,
) -> EtlResult<DataSet> {
    if raw.row_count() == 0 {
        tracing::info!(make = %target.make, model = %target.model, "no complaints returned");
        return Ok(empty_canonical());
    }
    let mut steps = StepTracker::new("complaints", options.observer.as_deref());

    let ds = steps.record("parse_complaint_dates", parse_complaint_dates(raw)?);
    let ds = steps.record("explode_products", explode(&ds, "products")?);
    let ds = steps.record("expand_products", unnest(&ds, "products", &EXCLUDED_PRODUCT_FIELDS)?);
    let ds = steps.record("drop_missing_components", drop_null_rows(&ds, &["components"])?);
    let ds = steps.record("split_components", split_explode(&ds, "components", ',')?);
    let ds = steps.record("keep_target_vehicle", keep_target_vehicle(&ds, target)?);
    Ok(ds)
}

fn empty_canonical() -> DataSet {
    let fields = SUMMARY_KEYS
        .iter()
        .map(|k| Field::new(*k, DataType::Utf8))
        .chain(DATE_COLUMNS.iter().map(|c| Field::new(*c, DataType::Date)))
        .collect();
    DataSet::new(Schema::new(fields), Vec::new())
}

/// Count complaints per manufacturer, vehicle and component, stamped with `run_date`.
pub fn summarize_complaints(canonical: &DataSet, run_date: NaiveDate) -> EtlResult<DataSet> {
    let summary = group_count(canonical, &SUMMARY_KEYS, SUMMARY_COUNT_COLUMN)?;
    let stamp = vec![Value::Date(run_date); summary.row_count()];
    Ok(summary.with_column(Field::new(EXTRACTION_DATE_COLUMN, DataType::Date), stamp))
}

/// Step 1: `MM/DD/YYYY` strings become dates. Absent columns are left absent.
pub fn parse_complaint_dates(ds: &DataSet) -> EtlResult<DataSet> {
    let mut out = ds.clone();
    for column in DATE_COLUMNS {
        if out.schema.index_of(column).is_none() {
            continue;
        }
        out = out.try_map_column(column, DataType::Date, |row, v| match v {
            Value::Null | Value::Date(_) => Ok(v.clone()),
            Value::Utf8(s) => NaiveDate::parse_from_str(s.trim(), COMPLAINT_DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| EtlError::parse(row + 1, column, s.as_str(), e.to_string())),
            other => Err(EtlError::parse(row + 1, column, other.to_text(), "expected MM/DD/YYYY")),
        })?;
    }
    Ok(out)
}

/// Step 6: rows for the configured make and model only.
pub fn keep_target_vehicle(ds: &DataSet, target: &ComplaintQuery) -> EtlResult<DataSet> {
    let make = ds.schema.require("productMake")?;
    let model = ds.schema.require("productModel")?;
    Ok(filter(ds, |row| {
        row[make].as_str() == Some(target.make.as_str())
            && row[model].as_str() == Some(target.model.as_str())
    }))
}
