mod common;

use common::{at, date, row, write_batch, HEADER};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use taxi_demand::cleaning::Cleaner;
use taxi_demand::data::{BatchFormat, BatchId, BatchPlan, BatchReader, DirectoryReader};
use taxi_demand::loader::{filter_window, DateWindow, Loader};
use taxi_demand::{DemandError, TripRecord};
use tempfile::TempDir;

fn csv_reader(dir: &TempDir) -> DirectoryReader {
    DirectoryReader::new(dir.path(), BatchFormat::Csv)
}

fn plan(months: &[(i32, u32)]) -> BatchPlan {
    BatchPlan::new(
        months
            .iter()
            .map(|&(y, m)| BatchId::new("yellow_tripdata", y, m).unwrap())
            .collect(),
    )
}

#[rstest]
#[case(at(2024, 1, 1, 0, 0), true)]
#[case(at(2024, 1, 31, 23, 59), true)]
#[case(at(2024, 2, 1, 0, 0), false)]
#[case(at(2023, 12, 31, 23, 59), false)]
fn test_window_is_closed_open(#[case] pickup: chrono::NaiveDateTime, #[case] kept: bool) {
    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
    let records = filter_window(vec![TripRecord::at(pickup)], &window);
    assert_eq!(records.len(), usize::from(kept));
}

#[test]
fn test_window_rejects_empty_range() {
    assert!(DateWindow::from_dates(date(2024, 2, 1), date(2024, 2, 1)).is_err());
}

#[test]
fn test_unknown_pickup_is_dropped_by_window() {
    let window = DateWindow::from_dates(date(2024, 1, 1), date(2025, 1, 1)).unwrap();
    let records = filter_window(vec![TripRecord::default()], &window);
    assert!(records.is_empty());
}

#[test]
fn test_load_concatenates_in_file_order_and_filters() {
    let dir = TempDir::new().unwrap();
    write_batch(
        dir.path(),
        "yellow_tripdata_2024-02.csv",
        &[
            row("2024-02-01 00:00:00", 1.0, 10.0),
            row("2024-03-01 00:00:00", 1.0, 10.0),
        ],
    );
    write_batch(
        dir.path(),
        "yellow_tripdata_2024-01.csv",
        &[
            row("2023-12-31 23:59:59", 1.0, 10.0),
            row("2024-01-01 00:00:00", 1.0, 10.0),
            row("2024-01-15 12:30:00", 2.0, 12.0),
        ],
    );

    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    // Plan given out of order on purpose
    let loaded = Loader::new(csv_reader(&dir))
        .load(&plan(&[(2024, 2), (2024, 1)]), &window)
        .unwrap();

    let pickups: Vec<_> = loaded.records.iter().map(|r| r.pickup.unwrap()).collect();
    assert_eq!(
        pickups,
        vec![
            at(2024, 1, 1, 0, 0),
            at(2024, 1, 15, 12, 30),
            at(2024, 2, 1, 0, 0),
        ]
    );
    assert_eq!(loaded.report.rows_read, 5);
    assert_eq!(loaded.report.rows_kept, 3);
    assert_eq!(
        loaded.report.batch_rows,
        vec![
            ("yellow_tripdata_2024-01".to_string(), 3),
            ("yellow_tripdata_2024-02".to_string(), 2),
        ]
    );
    for record in &loaded.records {
        assert!(window.contains(record.pickup.unwrap()));
    }
}

#[test]
fn test_duplicates_across_batches_are_kept() {
    let dir = TempDir::new().unwrap();
    let same = row("2024-01-31 10:00:00", 1.0, 10.0);
    write_batch(dir.path(), "yellow_tripdata_2024-01.csv", &[same.clone()]);
    write_batch(dir.path(), "yellow_tripdata_2024-02.csv", &[same]);

    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    let loaded = Loader::new(csv_reader(&dir))
        .load(&plan(&[(2024, 1), (2024, 2)]), &window)
        .unwrap();

    assert_eq!(loaded.records.len(), 2);
}

#[test]
fn test_missing_batch_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_batch(
        dir.path(),
        "yellow_tripdata_2024-01.csv",
        &[row("2024-01-02 08:00:00", 1.0, 10.0)],
    );

    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    let result = Loader::new(csv_reader(&dir)).load(&plan(&[(2024, 1), (2024, 2)]), &window);

    match result {
        Err(DemandError::MissingSource { path }) => {
            assert!(path.ends_with("yellow_tripdata_2024-02.csv"));
        }
        other => panic!("expected MissingSource, got {:?}", other),
    }
}

#[test]
fn test_missing_column_is_malformed() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("yellow_tripdata_2024-01.csv"),
        "tpep_pickup_datetime,trip_distance\n2024-01-02 08:00:00,1.0\n",
    )
    .unwrap();

    let batch = BatchId::new("yellow_tripdata", 2024, 1).unwrap();
    let result = csv_reader(&dir).read_batch(&batch);
    assert!(matches!(result, Err(DemandError::MalformedRecord { .. })));
}

#[test]
fn test_non_numeric_value_is_malformed() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("yellow_tripdata_2024-01.csv"),
        format!("{}\n2024-01-02 08:00:00,far,10,15,1,2.5,0,1,N\n", HEADER),
    )
    .unwrap();

    let batch = BatchId::new("yellow_tripdata", 2024, 1).unwrap();
    match csv_reader(&dir).read_batch(&batch) {
        Err(DemandError::MalformedRecord { source_id, .. }) => {
            assert_eq!(source_id, "yellow_tripdata_2024-01");
        }
        other => panic!("expected MalformedRecord, got {:?}", other),
    }
}

#[test]
fn test_unparseable_pickup_is_counted_not_fatal() {
    let dir = TempDir::new().unwrap();
    write_batch(
        dir.path(),
        "yellow_tripdata_2024-01.csv",
        &[
            row("not a time", 1.0, 10.0),
            row("2024-01-02 08:00:00", 1.0, 10.0),
        ],
    );

    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
    let loaded = Loader::new(csv_reader(&dir))
        .load(&plan(&[(2024, 1)]), &window)
        .unwrap();

    assert_eq!(loaded.report.rows_read, 2);
    assert_eq!(loaded.report.unknown_pickups, 1);
    assert_eq!(loaded.records.len(), 1);
}

#[test]
fn test_empty_fields_become_missing() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("yellow_tripdata_2024-01.csv"),
        format!("{}\n2024-01-02 08:00:00,,10,15,,,,,\n", HEADER),
    )
    .unwrap();

    let batch = BatchId::new("yellow_tripdata", 2024, 1).unwrap();
    let records = csv_reader(&dir).read_batch(&batch).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trip_distance, None);
    assert_eq!(records[0].fare_amount, Some(10.0));
    assert_eq!(records[0].airport_fee, None);
    assert_eq!(records[0].store_and_fwd_flag, None);
}

#[test]
fn test_discover_lists_matching_batches() {
    let dir = TempDir::new().unwrap();
    write_batch(dir.path(), "yellow_tripdata_2025-01.csv", &[]);
    write_batch(dir.path(), "yellow_tripdata_2024-12.csv", &[]);
    write_batch(dir.path(), "green_tripdata_2024-12.csv", &[]);
    fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let found = csv_reader(&dir).discover("yellow_tripdata").unwrap();
    let names: Vec<String> = found.iter().map(|b| b.to_string()).collect();

    assert_eq!(
        names,
        vec!["yellow_tripdata_2024-12", "yellow_tripdata_2025-01"]
    );
}

#[test]
fn test_year_plan_with_extra_month() {
    let plan = BatchPlan::year("yellow_tripdata", 2024)
        .unwrap()
        .with_month("yellow_tripdata", 2025, 1)
        .unwrap();

    assert_eq!(plan.len(), 13);
    assert_eq!(plan.batches()[0].to_string(), "yellow_tripdata_2024-01");
    assert_eq!(plan.batches()[12].to_string(), "yellow_tripdata_2025-01");
}

#[test]
fn test_nan_fare_is_loaded_as_missing_and_imputed() {
    let dir = TempDir::new().unwrap();
    write_batch(
        dir.path(),
        "yellow_tripdata_2024-01.csv",
        &[
            row("2024-01-02 08:00:00", 1.0, 10.0),
            row("2024-01-02 09:00:00", 1.0, 20.0),
            row("2024-01-02 10:00:00", 1.0, f64::NAN),
        ],
    );

    let window = DateWindow::from_dates(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
    let loaded = Loader::new(csv_reader(&dir))
        .load(&plan(&[(2024, 1)]), &window)
        .unwrap();
    assert_eq!(loaded.records[2].fare_amount, None);
    assert_eq!(loaded.records[2].total_amount, None);

    let cleaned = Cleaner::default().clean(&loaded.records).unwrap();
    assert_eq!(cleaned.records[2].fare_amount, Some(15.0));
}
