use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::json;
use vehicle_data_etl::ingestion::json::ingest_json_from_str;
use vehicle_data_etl::pipeline::stations::{
    drop_deprecated_columns, drop_street_cities, fill_access_days_time, keep_electric,
    normalize_workplace_charging, CANADIAN_PROVINCES, SPARSE_COLUMN_THRESHOLD,
    SUMMARY_COUNT_COLUMN,
};
use vehicle_data_etl::pipeline::{
    clean_stations, summarize_stations, CleanOptions, RecordingStepObserver,
};
use vehicle_data_etl::processing::{drop_duplicates, drop_sparse_columns, reduce, ReduceOp};
use vehicle_data_etl::types::{DataSet, DataType, Value};

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn raw_stations() -> DataSet {
    let body = std::fs::read_to_string("tests/fixtures/stations.json").unwrap();
    ingest_json_from_str(&body, "fuel_stations").unwrap()
}

fn texts(ds: &DataSet, column: &str) -> Vec<String> {
    ds.column(column).unwrap().map(Value::to_text).collect()
}

fn station(id: i64, city: &str, state: Option<&str>, phone: &str, evse: i64) -> serde_json::Value {
    json!({
        "id": id, "fuel_type_code": "ELEC", "station_name": format!("Station {id}"),
        "city": city, "state": state, "country": "US", "access_code": "public",
        "access_days_time": "24 hours daily", "ev_level2_evse_num": evse,
        "ev_connector_types": ["J1772"], "ev_network": "ChargePoint Network",
        "ev_network_web": "https://www.chargepoint.com/", "ev_workplace_charging": false,
        "station_phone": phone, "date_last_confirmed": "2024-04-01",
        "open_date": "2020-01-01", "updated_at": "2024-04-01T08:00:00Z"
    })
}

/// Feed of `stations` (one charger each) plus larger sites that the outlier trim removes.
fn feed_with_large_sites(mut stations: Vec<serde_json::Value>) -> DataSet {
    let large = [("Boise", "ID"), ("Reno", "NV"), ("Tulsa", "OK"), ("Omaha", "NE"), ("Fargo", "ND")];
    for (i, (city, state)) in large.into_iter().enumerate() {
        stations.push(station(100 + i as i64, city, Some(state), "555-555-0100", 10));
    }
    ingest_json_from_str(&json!({ "fuel_stations": stations }).to_string(), "fuel_stations").unwrap()
}

fn location(ds: &DataSet) -> Vec<(String, String, String)> {
    let (city, state, country) = (
        ds.schema.index_of("city").unwrap(),
        ds.schema.index_of("state").unwrap(),
        ds.schema.index_of("country").unwrap(),
    );
    ds.rows
        .iter()
        .map(|r| (r[city].to_text(), r[state].to_text(), r[country].to_text()))
        .collect()
}

#[test]
fn cleaned_stations_are_electric_scalar_and_digit_free() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();

    assert_eq!(clean.row_count(), 5);
    assert!(clean.column("fuel_type_code").unwrap().all(|v| v.as_str() == Some("ELEC")));
    assert!(clean
        .column("ev_connector_types")
        .unwrap()
        .all(|v| !matches!(v, Value::List(_))));
    assert!(clean
        .column("city")
        .unwrap()
        .all(|v| !v.to_text().chars().any(|c| c.is_ascii_digit())));
    for column in ["groups_with_access_code", "ng_psi", "bd_blends"] {
        assert!(clean.schema.index_of(column).is_none(), "{column} should be dropped");
    }
}

#[test]
fn toronto_station_becomes_two_canadian_rows() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();
    let toronto = clean.filter_rows(|row| {
        let idx = clean.schema.index_of("city").unwrap();
        row[idx].as_str() == Some("Toronto")
    });

    assert_eq!(toronto.row_count(), 2);
    assert_eq!(texts(&toronto, "country"), vec!["CA", "CA"]);
    assert_eq!(texts(&toronto, "ev_connector_types"), vec!["J1772", "CHAdeMO"]);
    assert_eq!(
        toronto.column("ev_level2_evse_num").unwrap().cloned().collect::<Vec<_>>(),
        vec![Value::Int64(0), Value::Int64(0)]
    );
    assert_eq!(texts(&toronto, "station_phone"), vec!["555-123-4567"; 2]);
    assert_eq!(texts(&toronto, "ev_network_web"), vec!["www.chargepoint.com"; 2]);
    assert_eq!(texts(&toronto, "updated_at"), vec!["2024-05-02 16:44:07"; 2]);
    assert_eq!(texts(&toronto, "monthYearHistory"), vec!["2024-05-01"; 2]);
}

#[test]
fn every_step_repairs_what_it_should() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();

    // Riverside Library had no state; Austin resolves to TX.
    let ids: Vec<_> = clean.column("id").unwrap().cloned().collect();
    assert_eq!(
        ids,
        vec![Value::Int64(1), Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Int64(3)]
    );
    assert_eq!(texts(&clean, "state"), vec!["ON", "ON", "TX", "TX", "TX"]);
    assert_eq!(
        texts(&clean, "station_phone"),
        vec!["555-123-4567", "555-123-4567", "512-555-0100", "000-000-0000", "000-000-0000"]
    );
    assert_eq!(
        texts(&clean, "ev_network_web"),
        vec!["www.chargepoint.com", "www.chargepoint.com", "www.tesla.com", "N/D", "N/D"]
    );
    assert_eq!(texts(&clean, "ev_network")[3], "N/D");
    assert_eq!(texts(&clean, "access_days_time")[2], "N/D");
    assert_eq!(texts(&clean, "open_date")[2], "1900-01-01");
    assert_eq!(texts(&clean, "date_last_confirmed")[3], "1900-01-01");
    assert_eq!(
        texts(&clean, "ev_workplace_charging"),
        vec!["true", "true", "false", "false", "false"]
    );

    let idx = clean.schema.index_of("updated_at").unwrap();
    assert_eq!(clean.schema.fields[idx].data_type, DataType::DateTime);
}

#[test]
fn canadian_provinces_always_map_to_ca() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();
    let (state, country) = (
        clean.schema.index_of("state").unwrap(),
        clean.schema.index_of("country").unwrap(),
    );
    for row in &clean.rows {
        if row[state].as_str().is_some_and(|s| CANADIAN_PROVINCES.contains(&s)) {
            assert_eq!(row[country], Value::text("CA"));
        }
    }
}

#[test]
fn repaired_provinces_are_canadian() {
    let raw = feed_with_large_sites(vec![
        station(1, "Toronto", Some("ON"), "416-555-0101", 1),
        station(2, "Toronto", None, "416-555-0102", 1),
        station(3, "Vancouver", Some("BC"), "604-555-0103", 1),
        station(4, "Vancouver", Some("WA"), "360-555-0104", 1),
    ]);
    let clean = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap();

    let ca = |city: &str, state: &str| (city.to_string(), state.to_string(), "CA".to_string());
    assert_eq!(
        location(&clean),
        vec![ca("Toronto", "ON"), ca("Toronto", "ON"), ca("Vancouver", "BC"), ca("Vancouver", "BC")]
    );
}

#[test]
fn repair_leaves_us_rows_alone() {
    let raw = feed_with_large_sites(vec![
        station(1, "Portland", Some("OR"), "503-555-0101", 1),
        station(2, "Portland", None, "503-555-0102", 1),
    ]);
    let clean = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap();
    assert_eq!(texts(&clean, "state"), vec!["OR", "OR"]);
    assert_eq!(texts(&clean, "country"), vec!["US", "US"]);
}

#[test]
fn filters_are_idempotent_on_clean_output() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();
    assert_eq!(drop_deprecated_columns(&clean), clean);
    assert_eq!(drop_duplicates(&clean), clean);
    assert_eq!(fill_access_days_time(&clean), clean);
    assert_eq!(drop_street_cities(&clean).unwrap(), clean);
    assert_eq!(normalize_workplace_charging(&clean), clean);
    assert_eq!(keep_electric(&clean).unwrap(), clean);
    // Holds here because no cleaned column keeps nulls; see the idempotence note in DESIGN.md.
    assert_eq!(drop_sparse_columns(&clean, SPARSE_COLUMN_THRESHOLD), clean);
}

#[test]
fn sparse_column_drop_is_relative_to_the_rows_left() {
    // Step 2 keeps `ev_pricing` (3 of 7 null); the trim then removes the priced large sites.
    let mut stations = vec![
        station(1, "Toronto", Some("ON"), "416-555-0101", 1),
        station(2, "Austin", Some("TX"), "512-555-0102", 1),
    ];
    stations[0]["ev_pricing"] = json!(null);
    stations[1]["ev_pricing"] = json!(null);
    let mut raw = feed_with_large_sites(stations);
    let pricing = raw.schema.index_of("ev_pricing").unwrap();
    for row in raw.rows.iter_mut().skip(2).take(4) {
        row[pricing] = Value::text("$0.25/kWh");
    }
    let clean = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap();

    assert!(clean.schema.index_of("ev_pricing").is_some());
    assert!(drop_sparse_columns(&clean, SPARSE_COLUMN_THRESHOLD)
        .schema
        .index_of("ev_pricing")
        .is_none());
}

#[test]
fn cleaned_phones_are_ten_digit_dashed() {
    let phone = Regex::new(r"^\d{3}-\d{3}-\d{4}$").unwrap();

    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();
    assert!(texts(&clean, "station_phone").iter().all(|p| phone.is_match(p)));

    let raw = feed_with_large_sites(vec![
        station(1, "Toronto", Some("ON"), "( ) - .", 1),
        station(2, "Austin", Some("TX"), "1-512-555-01234", 1),
        station(3, "Denver", Some("CO"), "+1 (303) 555-0110", 1),
    ]);
    let clean = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap();
    let phones = texts(&clean, "station_phone");
    assert_eq!(phones, vec!["000-000-0000", "151-255-5012", "130-355-5011"]);
    assert!(phones.iter().all(|p| phone.is_match(p)), "{phones:?}");
}

#[test]
fn summary_counts_partition_the_clean_table() {
    let clean = clean_stations(&raw_stations(), &CleanOptions::new(run_date())).unwrap();
    let summary = summarize_stations(&clean).unwrap();

    assert_eq!(
        summary.schema.field_names().collect::<Vec<_>>(),
        vec![
            "monthYearHistory",
            "fuel_type_code",
            "country",
            "state",
            "city",
            "ev_connector_types",
            "numDifConnectors"
        ]
    );
    assert_eq!(
        reduce(&summary, SUMMARY_COUNT_COLUMN, ReduceOp::Sum),
        Some(Value::Int64(clean.row_count() as i64))
    );
    assert_eq!(texts(&summary, "city"), vec!["Toronto", "Toronto", "Austin", "Austin"]);
    assert_eq!(
        texts(&summary, "ev_connector_types"),
        vec!["CHAdeMO", "J1772", "J1772", "NEMA515"]
    );
    assert_eq!(texts(&summary, SUMMARY_COUNT_COLUMN), vec!["1", "1", "2", "1"]);
}

#[test]
fn observer_sees_all_sixteen_steps() {
    let observer = Arc::new(RecordingStepObserver::default());
    let options = CleanOptions::new(run_date()).with_observer(observer.clone());
    clean_stations(&raw_stations(), &options).unwrap();

    let events = observer.events();
    assert_eq!(events.len(), 16);
    assert_eq!(events[0].0, "drop_deprecated_columns");
    assert_eq!(events[2].2.rows, 8);
    assert_eq!(events[15].0, "keep_electric");
    assert_eq!(events[15].1, 16);
    assert_eq!(events[15].2.rows, 5);
}

#[test]
fn missing_state_column_is_a_schema_mismatch() {
    let raw = ingest_json_from_str(
        r#"{"fuel_stations":[{"id":1,"city":"Austin","fuel_type_code":"ELEC","access_code":"public"}]}"#,
        "fuel_stations",
    )
    .unwrap();
    let err = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap_err();
    assert!(err.to_string().contains("missing required column 'state'"));
}

#[test]
fn empty_feed_has_no_columns_to_clean() {
    let raw = ingest_json_from_str(r#"{"fuel_stations":[]}"#, "fuel_stations").unwrap();
    let err = clean_stations(&raw, &CleanOptions::new(run_date())).unwrap_err();
    assert!(err.to_string().contains("schema mismatch"));
}
