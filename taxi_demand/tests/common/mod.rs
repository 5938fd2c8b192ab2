#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use taxi_demand::aggregation::{CountPoint, CountSeries, DailySeries};
use taxi_demand::TripRecord;

pub const HEADER: &str = "tpep_pickup_datetime,trip_distance,fare_amount,total_amount,passenger_count,congestion_surcharge,Airport_fee,RatecodeID,store_and_fwd_flag";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

/// One CSV row with every field present
pub fn row(pickup: &str, distance: f64, fare: f64) -> String {
    format!("{},{},{},{},1,2.5,0,1,N", pickup, distance, fare, fare + 5.0)
}

/// Write a CSV batch file with the standard header
pub fn write_batch(dir: &Path, name: &str, rows: &[String]) {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    fs::write(dir.join(name), text).unwrap();
}

/// A fully populated record
pub fn trip(pickup: NaiveDateTime, distance: f64, fare: f64) -> TripRecord {
    TripRecord {
        pickup: Some(pickup),
        trip_distance: Some(distance),
        fare_amount: Some(fare),
        total_amount: Some(fare + 5.0),
        passenger_count: Some(1.0),
        congestion_surcharge: Some(2.5),
        airport_fee: Some(0.0),
        rate_code: Some(1.0),
        store_and_fwd_flag: Some("N".to_string()),
    }
}

/// Daily series of consecutive days starting at `start`
pub fn daily(start: NaiveDate, counts: &[u64]) -> DailySeries {
    CountSeries::new(
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| CountPoint::new(start + chrono::Duration::days(i as i64), c))
            .collect(),
    )
    .unwrap()
}
