mod common;

use approx::assert_relative_eq;
use common::{daily, date};
use pretty_assertions::assert_eq;
use taxi_demand::evaluation::{align, evaluate, CrossValidation};
use taxi_demand::metrics::forecast_accuracy;
use taxi_demand::models::{forecast_frame, series_frame, SeasonalTrend};
use taxi_demand::{DemandError, FittedForecaster, ForecastPoint, Forecaster};

fn point(date: chrono::NaiveDate, yhat: f64) -> ForecastPoint {
    ForecastPoint {
        date,
        yhat,
        yhat_lower: yhat - 1.0,
        yhat_upper: yhat + 1.0,
        trend: yhat,
        weekly: 0.0,
    }
}

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let metrics = forecast_accuracy(&actual, &predicted).unwrap();

    assert_relative_eq!(metrics.mae, 2.4);
    assert_relative_eq!(metrics.mse, 6.0);
    assert_relative_eq!(metrics.rmse, 6.0_f64.sqrt());
    // (20 + 10 + 10 + 7.5 + 4) / 5
    assert_relative_eq!(metrics.mape.unwrap(), 10.3, epsilon = 1e-9);
}

#[test]
fn test_mape_skips_zero_actuals() {
    let metrics = forecast_accuracy(&[0.0, 10.0], &[5.0, 12.0]).unwrap();

    assert_relative_eq!(metrics.mape.unwrap(), 20.0);
    assert_relative_eq!(metrics.mae, 3.5);
}

#[test]
fn test_inner_join_drops_unmatched_dates() {
    let actual = daily(date(2024, 1, 1), &[10, 20, 30]);
    let forecast = vec![
        point(date(2023, 12, 31), 99.0),
        point(date(2024, 1, 2), 22.0),
        point(date(2024, 1, 3), 27.0),
        point(date(2024, 1, 4), 99.0),
    ];

    let aligned = align(&actual, &forecast);
    assert_eq!(aligned.len(), 2);
    assert_eq!(aligned[0].date, date(2024, 1, 2));

    let evaluation = evaluate(&actual, &forecast).unwrap();
    assert_eq!(evaluation.metrics.count, 2);
    assert_relative_eq!(evaluation.metrics.mae, 2.5);
}

#[test]
fn test_no_overlap_is_an_error() {
    let actual = daily(date(2024, 1, 1), &[10, 20]);
    let forecast = vec![point(date(2024, 2, 1), 10.0)];

    assert!(matches!(evaluate(&actual, &forecast), Err(DemandError::NoOverlap)));
}

#[test]
fn test_future_dates_follow_history() {
    // Gap between Jan 2 and Jan 5 stays in the history part
    let series = taxi_demand::aggregation::CountSeries::new(vec![
        taxi_demand::aggregation::CountPoint::new(date(2024, 1, 1), 10),
        taxi_demand::aggregation::CountPoint::new(date(2024, 1, 2), 12),
        taxi_demand::aggregation::CountPoint::new(date(2024, 1, 5), 15),
    ])
    .unwrap();
    let fitted = SeasonalTrend::default().fit(&series).unwrap();

    assert_eq!(
        fitted.future_dates(2),
        vec![
            date(2024, 1, 1),
            date(2024, 1, 2),
            date(2024, 1, 5),
            date(2024, 1, 6),
            date(2024, 1, 7),
        ]
    );
    assert_eq!(fitted.forecast(2).unwrap().len(), 5);
}

#[test]
fn test_held_out_forecast_of_trend() {
    let counts: Vec<u64> = (0..60).map(|i| 1_000 + 10 * i).collect();
    let series = daily(date(2024, 1, 1), &counts);
    let split = taxi_demand::split::train_test_split(&series, 10).unwrap();

    let fitted = SeasonalTrend::default().fit(&split.train).unwrap();
    let forecast = fitted.forecast(10).unwrap();
    let tail = &forecast[forecast.len() - 10..];

    let evaluation = evaluate(&split.test, tail).unwrap();
    assert_eq!(evaluation.metrics.count, 10);
    assert!(evaluation.metrics.mae < 1e-6);
}

#[test]
fn test_cross_validation_folds() {
    let counts: Vec<u64> = (0..20).map(|i| 50 + i).collect();
    let series = daily(date(2024, 1, 1), &counts);

    let cv = CrossValidation::new(10, 3, 4).unwrap();
    let folds = cv.run(&SeasonalTrend::default(), &series).unwrap();

    // Cutoffs after 10, 13 and 16 training points
    let train_lens: Vec<usize> = folds.iter().map(|f| f.train_len).collect();
    assert_eq!(train_lens, vec![10, 13, 16]);
    assert_eq!(folds[0].cutoff, date(2024, 1, 10));
    for fold in &folds {
        assert_eq!(fold.metrics.count, 4);
    }
}

#[test]
fn test_cross_validation_rejects_bad_windows() {
    assert!(CrossValidation::new(1, 1, 1).is_err());
    assert!(CrossValidation::new(5, 0, 1).is_err());

    let series = daily(date(2024, 1, 1), &[1, 2, 3, 4, 5]);
    let cv = CrossValidation::new(4, 1, 2).unwrap();
    assert!(cv.run(&SeasonalTrend::default(), &series).is_err());
}

#[test]
fn test_frames_have_expected_shape() {
    let series = daily(date(2024, 1, 1), &[3, 4, 5]);
    let df = series_frame(&series).unwrap();
    assert_eq!(df.shape(), (3, 2));
    assert_eq!(df.get_column_names(), vec!["ds", "y"]);

    let fitted = SeasonalTrend::default().fit(&series).unwrap();
    let forecast = forecast_frame(&fitted.forecast(2).unwrap()).unwrap();
    assert_eq!(forecast.shape(), (5, 6));
}
