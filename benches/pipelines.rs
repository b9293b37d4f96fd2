/// Throughput of the station and complaint cleaners on synthetic feeds.
///
/// Run with: cargo bench --bench pipelines
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use vehicle_data_etl::config::ComplaintQuery;
use vehicle_data_etl::ingestion::json::ingest_json_records;
use vehicle_data_etl::pipeline::{
    clean_complaints, clean_stations, summarize_complaints, summarize_stations, CleanOptions,
};
use vehicle_data_etl::types::DataSet;

const CITIES: [(&str, &str); 6] = [
    ("Toronto", "ON"),
    ("Austin", "TX"),
    ("Portland", "OR"),
    ("Montreal", "QC"),
    ("Denver", "CO"),
    ("Seattle", "WA"),
];

fn synthetic_stations(count: usize) -> DataSet {
    let records: Vec<_> = (0..count)
        .map(|i| {
            let (city, state) = CITIES[i % CITIES.len()];
            let connectors = &["J1772", "CHAdeMO", "TESLA"][..(i % 3) + 1];
            json!({
                "id": i,
                "fuel_type_code": if i % 5 == 0 { "CNG" } else { "ELEC" },
                "city": city,
                "state": if i % 7 == 0 { None } else { Some(state) },
                "country": "US",
                "access_code": "public",
                "access_days_time": if i % 3 == 0 { None } else { Some("24 hours daily") },
                "ev_level2_evse_num": i % 11,
                "ev_connector_types": connectors,
                "ev_network": "ChargePoint Network",
                "ev_network_web": "http://www.chargepoint.com/",
                "ev_workplace_charging": i % 2 == 0,
                "station_phone": format!("(555) {:03}-{:04}", i % 1000, i % 10000),
                "date_last_confirmed": "2024-04-30",
                "open_date": "2019-11-30",
                "updated_at": "2024-05-02T16:44:07Z",
            })
        })
        .collect();
    ingest_json_records(&records).unwrap()
}

fn synthetic_complaints(count: usize) -> DataSet {
    let records: Vec<_> = (0..count)
        .map(|i| {
            let components = ["AIRBAGS, SEATS", "ENGINE", "ELECTRICAL SYSTEM, STEERING"][i % 3];
            json!({
                "odiNumber": 11_400_000 + i,
                "manufacturer": "FCA US LLC",
                "dateComplaintFiled": "03/15/2021",
                "dateOfIncident": "02/28/2021",
                "components": components,
                "products": [
                    {"productYear": "2021", "productMake": "JEEP", "productModel": "WRANGLER"},
                    {"productYear": "2021", "productMake": "JEEP", "productModel": "GLADIATOR"}
                ],
            })
        })
        .collect();
    ingest_json_records(&records).unwrap()
}

fn bench_pipelines(c: &mut Criterion) {
    let options = CleanOptions::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    let target = ComplaintQuery::default();

    let mut group = c.benchmark_group("clean_and_summarize");
    for size in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        let stations = synthetic_stations(size);
        group.bench_with_input(BenchmarkId::new("stations", size), &stations, |b, raw| {
            b.iter(|| {
                let clean = clean_stations(black_box(raw), &options).unwrap();
                summarize_stations(&clean).unwrap()
            })
        });

        let complaints = synthetic_complaints(size);
        group.bench_with_input(BenchmarkId::new("complaints", size), &complaints, |b, raw| {
            b.iter(|| {
                let clean = clean_complaints(black_box(raw), &target, &options).unwrap();
                summarize_complaints(&clean, options.run_date).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipelines);
criterion_main!(benches);
