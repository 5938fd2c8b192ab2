//! Trip record schema

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Source column holding the pickup timestamp
pub const PICKUP_COLUMN: &str = "tpep_pickup_datetime";

/// One taxi trip with the fields the pipeline uses.
///
/// Every field is optional: a `None` is a missing value in the source, or a
/// value the cleaner invalidated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripRecord {
    /// Pickup time; `None` when the source value could not be parsed
    pub pickup: Option<NaiveDateTime>,
    pub trip_distance: Option<f64>,
    pub fare_amount: Option<f64>,
    pub total_amount: Option<f64>,
    pub passenger_count: Option<f64>,
    pub congestion_surcharge: Option<f64>,
    pub airport_fee: Option<f64>,
    pub rate_code: Option<f64>,
    pub store_and_fwd_flag: Option<String>,
}

impl TripRecord {
    /// Record picked up at `pickup` with every other field missing
    pub fn at(pickup: NaiveDateTime) -> Self {
        Self {
            pickup: Some(pickup),
            ..Self::default()
        }
    }

    /// Calendar date of the pickup, if known
    pub fn pickup_date(&self) -> Option<NaiveDate> {
        self.pickup.map(|ts| ts.date())
    }

    /// Value of a numeric field; NaN and infinities read as missing
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        let value = match field {
            NumericField::TripDistance => self.trip_distance,
            NumericField::FareAmount => self.fare_amount,
            NumericField::TotalAmount => self.total_amount,
            NumericField::PassengerCount => self.passenger_count,
            NumericField::CongestionSurcharge => self.congestion_surcharge,
            NumericField::AirportFee => self.airport_fee,
            NumericField::RateCode => self.rate_code,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn set_numeric(&mut self, field: NumericField, value: Option<f64>) {
        let slot = match field {
            NumericField::TripDistance => &mut self.trip_distance,
            NumericField::FareAmount => &mut self.fare_amount,
            NumericField::TotalAmount => &mut self.total_amount,
            NumericField::PassengerCount => &mut self.passenger_count,
            NumericField::CongestionSurcharge => &mut self.congestion_surcharge,
            NumericField::AirportFee => &mut self.airport_fee,
            NumericField::RateCode => &mut self.rate_code,
        };
        *slot = value;
    }

    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::StoreAndFwdFlag => self.store_and_fwd_flag.as_deref(),
        }
    }

    pub fn set_categorical(&mut self, field: CategoricalField, value: Option<String>) {
        match field {
            CategoricalField::StoreAndFwdFlag => self.store_and_fwd_flag = value,
        }
    }
}

/// Numeric trip fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    TripDistance,
    FareAmount,
    TotalAmount,
    PassengerCount,
    CongestionSurcharge,
    AirportFee,
    RateCode,
}

impl NumericField {
    pub const ALL: [NumericField; 7] = [
        NumericField::TripDistance,
        NumericField::FareAmount,
        NumericField::TotalAmount,
        NumericField::PassengerCount,
        NumericField::CongestionSurcharge,
        NumericField::AirportFee,
        NumericField::RateCode,
    ];

    /// Column name in the source batches
    pub fn column(&self) -> &'static str {
        match self {
            NumericField::TripDistance => "trip_distance",
            NumericField::FareAmount => "fare_amount",
            NumericField::TotalAmount => "total_amount",
            NumericField::PassengerCount => "passenger_count",
            NumericField::CongestionSurcharge => "congestion_surcharge",
            NumericField::AirportFee => "Airport_fee",
            NumericField::RateCode => "RatecodeID",
        }
    }

    /// Other spellings the column has had across dataset vintages
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            NumericField::AirportFee => &["airport_fee"],
            _ => &[],
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Categorical trip fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    StoreAndFwdFlag,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 1] = [CategoricalField::StoreAndFwdFlag];

    pub fn column(&self) -> &'static str {
        match self {
            CategoricalField::StoreAndFwdFlag => "store_and_fwd_flag",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a pickup timestamp as a naive local time.
///
/// Returns `None` for anything unrecognised; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();

        assert_eq!(parse_timestamp("2024-03-05 14:07:09"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:07:09"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-03-05 14:07:09.000 "), Some(expected));
        assert_eq!(parse_timestamp("03/05/2024 02:07:09 PM"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-01"), Some(midnight));
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2024-13-45 99:00:00"), None);
    }

    #[test]
    fn test_field_accessors_round_trip() {
        let mut record = TripRecord::default();
        for field in NumericField::ALL {
            assert_eq!(record.numeric(field), None);
            record.set_numeric(field, Some(1.5));
            assert_eq!(record.numeric(field), Some(1.5));
        }

        record.set_categorical(CategoricalField::StoreAndFwdFlag, Some("N".to_string()));
        assert_eq!(record.categorical(CategoricalField::StoreAndFwdFlag), Some("N"));
    }
}
