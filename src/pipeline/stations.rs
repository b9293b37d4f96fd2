//! Alternative-fuel station cleaner and aggregator.
//!
//! [`clean_stations`] applies sixteen steps in a fixed order. The order matters: the sparse
//! column threshold (step 2) and the outlier percentile (step 14) are computed on the table as
//! it stands at that point, not on the raw feed.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{EtlError, EtlResult};
use crate::processing::{
    drop_duplicates, drop_null_rows, drop_sparse_columns, explode, fill_null, filter_column,
    filter_eq, group_count, left_join_replace, quantile, Lookup,
};
use crate::types::{DataSet, DataType, Field, Value};

use super::observer::StepTracker;
use super::CleanOptions;

/// Fields the registry still returns but no longer maintains.
pub const DEPRECATED_COLUMNS: [&str; 7] = [
    "groups_with_access_code",
    "ng_fill_type_code",
    "ng_psi",
    "ng_vehicle_class",
    "cng_vehicle_class",
    "lng_vehicle_class",
    "groups_with_access_code_fr",
];

/// Province/territory codes whose rows get `country = "CA"`.
pub const CANADIAN_PROVINCES: [&str; 10] = ["ON", "QC", "NS", "NB", "MB", "BC", "PE", "SK", "AB", "NL"];

/// Columns with a larger null fraction are dropped.
pub const SPARSE_COLUMN_THRESHOLD: f64 = 0.5;

/// Rows at or above this quantile of `ev_level2_evse_num` are dropped.
pub const OUTLIER_QUANTILE: f64 = 0.75;

/// Placeholder for missing free-text values.
pub const NOT_DEFINED: &str = "N/D";

/// Placeholder for missing phone numbers.
pub const PHONE_PLACEHOLDER: &str = "0000000000";

/// Snapshot date column stamped on every row.
pub const SNAPSHOT_COLUMN: &str = "monthYearHistory";

/// Group key of the station summary table.
pub const SUMMARY_KEYS: [&str; 6] = [
    SNAPSHOT_COLUMN,
    "fuel_type_code",
    "country",
    "state",
    "city",
    "ev_connector_types",
];

/// Count column of the station summary table.
pub const SUMMARY_COUNT_COLUMN: &str = "numDifConnectors";

const DATE_COLUMNS: [&str; 2] = ["date_last_confirmed", "open_date"];
const TIMESTAMP_COLUMN: &str = "updated_at";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid regex"));
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").expect("valid regex"));

/// Date substituted for missing dates.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Run the full station cleaner on a raw `fuel_stations` table.
pub fn clean_stations(raw: &DataSet, options: &CleanOptions) -> EtlResult<DataSet> {
    let mut steps = StepTracker::new("stations", options.observer.as_deref());

    let ds = steps.record("drop_deprecated_columns", drop_deprecated_columns(raw));
    let ds = steps.record("drop_sparse_columns", drop_sparse_columns(&ds, SPARSE_COLUMN_THRESHOLD));
    let ds = steps.record("drop_duplicates", drop_duplicates(&ds));
    let ds = steps.record("fill_access_days_time", fill_access_days_time(&ds));
    let ds = steps.record("stamp_snapshot_date", stamp_snapshot_date(&ds, options.run_date));
    let ds = steps.record("assign_canadian_country", assign_canadian_country(&ds)?);
    let ds = repair_city_state(&ds)?;
    // The repair can move a row into a province, so the country follows it.
    let ds = steps.record("repair_city_state", assign_canadian_country(&ds)?);
    let ds = steps.record("drop_street_cities", drop_street_cities(&ds)?);
    let ds = steps.record("normalize_dates", normalize_dates(&ds)?);
    let ds = steps.record("normalize_numbers", normalize_numbers(&ds)?);
    let ds = steps.record("normalize_workplace_charging", normalize_workplace_charging(&ds));
    let ds = steps.record("normalize_network_web", normalize_network_web(&ds));
    let ds = steps.record("normalize_phone", normalize_phone(&ds));
    let ds = steps.record("trim_evse_outliers", trim_evse_outliers(&ds)?);
    let ds = steps.record("explode_connectors", explode_connectors(&ds)?);
    let ds = steps.record("keep_electric", keep_electric(&ds)?);
    Ok(ds)
}

/// Count connectors per snapshot date, fuel type, location and connector type.
pub fn summarize_stations(canonical: &DataSet) -> EtlResult<DataSet> {
    group_count(canonical, &SUMMARY_KEYS, SUMMARY_COUNT_COLUMN)
}

/// Step 1.
pub fn drop_deprecated_columns(ds: &DataSet) -> DataSet {
    ds.drop_columns(&DEPRECATED_COLUMNS)
}

/// Step 4.
pub fn fill_access_days_time(ds: &DataSet) -> DataSet {
    fill_null(ds, "access_days_time", Value::text(NOT_DEFINED))
}

/// Step 5: every row gets the run date.
pub fn stamp_snapshot_date(ds: &DataSet, run_date: NaiveDate) -> DataSet {
    ds.with_column(
        Field::new(SNAPSHOT_COLUMN, DataType::Date),
        vec![Value::Date(run_date); ds.row_count()],
    )
}

/// Step 6: rows in a Canadian province are in Canada, whatever the feed says.
pub fn assign_canadian_country(ds: &DataSet) -> EtlResult<DataSet> {
    let state_idx = ds.schema.require("state")?;
    let states: Vec<bool> = ds
        .rows
        .iter()
        .map(|r| r[state_idx].as_str().is_some_and(|s| CANADIAN_PROVINCES.contains(&s)))
        .collect();
    let mut row = 0;
    Ok(ds.map_column("country", DataType::Utf8, |v| {
        let canadian = states[row];
        row += 1;
        if canadian { Value::text("CA") } else { v.clone() }
    }))
}

/// Step 7: resolve each city to the state of its first occurrence, then drop rows that still
/// have no state or no access code.
pub fn repair_city_state(ds: &DataSet) -> EtlResult<DataSet> {
    let lookup = Lookup::first_by_key(ds, "city", "state")?;
    let joined = left_join_replace(ds, "city", "state", &lookup)?;
    drop_null_rows(&joined, &["state", "access_code"])
}

/// Step 8: a city containing an ASCII digit is a street address.
pub fn drop_street_cities(ds: &DataSet) -> EtlResult<DataSet> {
    filter_column(ds, "city", |v| !v.as_str().is_some_and(|s| DIGIT.is_match(s)))
}

/// Step 9: fill missing dates with 1900-01-01 and parse them; `updated_at` keeps its time of
/// day but loses its offset.
pub fn normalize_dates(ds: &DataSet) -> EtlResult<DataSet> {
    let mut out = ds.clone();
    for column in DATE_COLUMNS {
        out = out.try_map_column(column, DataType::Date, |row, v| match v {
            Value::Null => Ok(Value::Date(sentinel_date())),
            Value::Date(_) => Ok(v.clone()),
            Value::DateTime(dt) => Ok(Value::Date(dt.date())),
            Value::Utf8(s) => parse_date(s)
                .map(Value::Date)
                .ok_or_else(|| EtlError::parse(row + 1, column, s.as_str(), "expected YYYY-MM-DD date")),
            other => Err(EtlError::parse(row + 1, column, other.to_text(), "expected date")),
        })?;
    }
    out.try_map_column(TIMESTAMP_COLUMN, DataType::DateTime, |row, v| match v {
        Value::Null => Ok(Value::DateTime(sentinel_date().and_time(chrono::NaiveTime::MIN))),
        Value::DateTime(_) => Ok(v.clone()),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(chrono::NaiveTime::MIN))),
        Value::Utf8(s) => parse_timestamp(s)
            .map(Value::DateTime)
            .ok_or_else(|| EtlError::parse(row + 1, TIMESTAMP_COLUMN, s.as_str(), "expected timestamp")),
        other => Err(EtlError::parse(row + 1, TIMESTAMP_COLUMN, other.to_text(), "expected timestamp")),
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|dt| dt.date()))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

/// Step 10: `ev_level2_evse_num` becomes an integer count (missing = 0) and `id` numeric.
pub fn normalize_numbers(ds: &DataSet) -> EtlResult<DataSet> {
    let ds = fill_null(ds, "ev_level2_evse_num", Value::Int64(0));
    let ds = ds.try_map_column("ev_level2_evse_num", DataType::Int64, |row, v| {
        let text = v.to_text();
        let text = text.strip_suffix(".0").unwrap_or(&text);
        to_numeric(row, "ev_level2_evse_num", text)
    })?;
    let ds = retype(ds, "ev_level2_evse_num");

    let ds = ds.try_map_column("id", DataType::Int64, |row, v| match v {
        Value::Null | Value::Int64(_) | Value::Float64(_) => Ok(v.clone()),
        other => to_numeric(row, "id", &other.to_text()),
    })?;
    Ok(retype(ds, "id"))
}

fn to_numeric(row: usize, column: &str, raw: &str) -> EtlResult<Value> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Int64(i));
    }
    trimmed
        .parse::<f64>()
        .map(Value::Float64)
        .map_err(|e| EtlError::parse(row + 1, column, raw, e.to_string()))
}

fn retype(mut ds: DataSet, column: &str) -> DataSet {
    if let Some(idx) = ds.schema.index_of(column).filter(|_| !ds.rows.is_empty()) {
        ds.schema.fields[idx].data_type = DataType::infer(ds.rows.iter().map(|r| &r[idx]));
    }
    ds
}

/// Step 11: missing means `false`; everything else by truthiness.
pub fn normalize_workplace_charging(ds: &DataSet) -> DataSet {
    ds.map_column("ev_workplace_charging", DataType::Bool, |v| {
        Value::Bool(match v {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int64(i) => *i != 0,
            Value::Float64(f) => *f != 0.0,
            Value::Utf8(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Struct(pairs) => !pairs.is_empty(),
            Value::Date(_) | Value::DateTime(_) => true,
        })
    })
}

/// Step 12: reduce `ev_network_web` to a `www.` hostname and fill network placeholders.
pub fn normalize_network_web(ds: &DataSet) -> DataSet {
    let ds = ds.map_column("ev_network_web", DataType::Utf8, |v| match v {
        Value::Utf8(s) => s.split('/').nth(2).map(Value::text).unwrap_or(Value::Null),
        _ => Value::Null,
    });
    let ds = fill_null(&ds, "ev_network", Value::text(NOT_DEFINED));
    let ds = fill_null(&ds, "ev_network_web", Value::text(NOT_DEFINED));
    ds.map_column("ev_network_web", DataType::Utf8, |v| match v.as_str() {
        Some(host) if host != NOT_DEFINED && !host.starts_with("www.") => {
            Value::text(format!("www.{host}"))
        }
        _ => v.clone(),
    })
}

/// Step 13: `XXX-XXX-XXXX` phone numbers.
pub fn normalize_phone(ds: &DataSet) -> DataSet {
    ds.map_column("station_phone", DataType::Utf8, |v| {
        let digits = match v {
            Value::Null => PHONE_PLACEHOLDER.to_string(),
            other => NON_ALPHANUMERIC.replace_all(&other.to_text(), "").into_owned(),
        };
        let digits = if digits.is_empty() { PHONE_PLACEHOLDER.to_string() } else { digits };
        Value::text(format_phone(&digits))
    })
}

/// Slice a bare number into `[0,3)-[3,6)-[6,10)`; short inputs yield short groups.
pub fn format_phone(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let part = |from: usize, to: usize| -> String {
        let from = from.min(chars.len());
        let to = to.min(chars.len());
        chars[from..to].iter().collect()
    };
    format!("{}-{}-{}", part(0, 3), part(3, 6), part(6, 10))
}

/// Step 14: keep rows strictly below the 75th percentile of `ev_level2_evse_num`.
pub fn trim_evse_outliers(ds: &DataSet) -> EtlResult<DataSet> {
    let cutoff = quantile(ds, "ev_level2_evse_num", OUTLIER_QUANTILE);
    filter_column(ds, "ev_level2_evse_num", |v| match (cutoff, v.as_f64()) {
        (Some(cutoff), Some(n)) => n < cutoff,
        _ => false,
    })
}

/// Step 15: one row per connector type.
pub fn explode_connectors(ds: &DataSet) -> EtlResult<DataSet> {
    explode(ds, "ev_connector_types")
}

/// Step 16.
pub fn keep_electric(ds: &DataSet) -> EtlResult<DataSet> {
    filter_eq(ds, "fuel_type_code", "ELEC")
}
