//! Integration test: sales forecasting pipeline end-to-end

use chrono::NaiveDate;
use polars::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

use storecast::data::SalesLoader;
use storecast::features;
use storecast::inference::{PredictionQuery, Predictor};
use storecast::training::{TrainConfig, Trainer};
use storecast::StorecastError;

/// Two stores, thirty consecutive weeks each, deterministic sales
fn write_sales_csv() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "Store,Date,Weekly_Sales,Holiday_Flag,Temperature,Fuel_Price,CPI,Unemployment"
    )
    .unwrap();

    let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
    for store in 1..=2i64 {
        for week in 0..30i64 {
            let date = start + chrono::Duration::weeks(week);
            let holiday = i64::from(week % 10 == 3);
            let sales = 1_000_000.0
                + 150_000.0 * store as f64
                + 25_000.0 * (week % 6) as f64
                + 80_000.0 * holiday as f64;
            writeln!(
                file,
                "{store},{},{sales:.2},{holiday},{:.2},{:.3},{:.3},{:.3}",
                date.format("%d-%m-%Y"),
                40.0 + (week % 20) as f64,
                2.5 + week as f64 * 0.01,
                211.0 + week as f64 * 0.05,
                8.1 - week as f64 * 0.005,
            )
            .unwrap();
        }
    }
    file
}

fn fast_config() -> TrainConfig {
    TrainConfig::new().with_n_estimators(25).with_max_depth(3)
}

#[test]
fn test_train_save_load_predict_round_trip() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    assert_eq!(raw.height(), 60);

    let engineered = features::engineer(&raw).unwrap();
    assert_eq!(engineered.height(), 60);
    assert_eq!(engineered.width(), 12);

    let (model, metrics) = Trainer::new(fast_config()).fit(&engineered).unwrap();
    assert_eq!(metrics.n_train + metrics.n_test, 60);
    assert_eq!(metrics.n_test, 12);
    assert!(metrics.r2.is_finite());
    assert!(metrics.mae >= 0.0);
    assert!(metrics.rmse >= metrics.mae);

    let artifact = NamedTempFile::new().unwrap();
    model.save(artifact.path()).unwrap();

    let predictor = Predictor::from_file(artifact.path()).unwrap();
    let query = PredictionQuery {
        store: 1,
        date: NaiveDate::from_ymd_opt(2010, 9, 3).unwrap(),
        holiday_flag: false,
        temperature: 55.0,
        fuel_price: 2.7,
        cpi: 212.0,
        unemployment: 8.0,
    };

    let forecast = predictor.predict_one(&query).unwrap();
    assert!(forecast.is_finite());
    // A forecast near the training range, far from zero
    assert!(forecast > 500_000.0, "forecast = {forecast}");

    // Same query, same answer
    assert_eq!(forecast, predictor.predict_one(&query).unwrap());
}

#[test]
fn test_loaded_model_matches_in_memory_model() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();
    let (model, _) = Trainer::new(fast_config()).fit(&engineered).unwrap();

    let artifact = NamedTempFile::new().unwrap();
    model.save(artifact.path()).unwrap();
    let loaded = Predictor::from_file(artifact.path()).unwrap();
    let in_memory = Predictor::new(model);

    let inputs = engineered.drop("Weekly_Sales").unwrap();
    let before = in_memory.predict(&inputs).unwrap();
    let after = loaded.predict(&inputs).unwrap();
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_metrics_are_reproducible() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();

    let (_, first) = Trainer::new(fast_config()).fit(&engineered).unwrap();
    let (_, second) = Trainer::new(fast_config()).fit(&engineered).unwrap();

    assert_eq!(first.r2, second.r2);
    assert_eq!(first.mae, second.mae);
    assert_eq!(first.rmse, second.rmse);
}

#[test]
fn test_different_seed_changes_the_holdout() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();

    let (_, a) = Trainer::new(fast_config().with_seed(1)).fit(&engineered).unwrap();
    let (_, b) = Trainer::new(fast_config().with_seed(2)).fit(&engineered).unwrap();

    // Different partitions should move the hold-out error
    assert_ne!(a.rmse, b.rmse);
}

#[test]
fn test_predict_rejects_missing_feature_column() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();
    let (model, _) = Trainer::new(fast_config()).fit(&engineered).unwrap();
    let predictor = Predictor::new(model);

    let inputs = engineered
        .drop("Weekly_Sales")
        .unwrap()
        .drop("CPI")
        .unwrap();
    let err = predictor.predict(&inputs).unwrap_err();
    assert!(matches!(err, StorecastError::SchemaMismatch(_)), "{err}");
    assert!(err.to_string().contains("CPI"), "{err}");
}

#[test]
fn test_predict_rejects_target_as_extra_column() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();
    let (model, _) = Trainer::new(fast_config()).fit(&engineered).unwrap();

    // Passing the engineered frame with the target still in it is a
    // schema mismatch, not a silent drop.
    let err = Predictor::new(model).predict(&engineered).unwrap_err();
    assert!(matches!(err, StorecastError::SchemaMismatch(_)), "{err}");
    assert!(err.to_string().contains("Weekly_Sales"), "{err}");
}

#[test]
fn test_train_rejects_unengineered_frame() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();

    let err = Trainer::new(fast_config()).fit(&raw).unwrap_err();
    assert!(matches!(err, StorecastError::SchemaError(_)), "{err}");
}

#[test]
fn test_corrupted_artifact_is_rejected() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();
    let (model, _) = Trainer::new(fast_config()).fit(&engineered).unwrap();

    let artifact = NamedTempFile::new().unwrap();
    model.save(artifact.path()).unwrap();

    // Flip one byte of the stored checksum
    let mut bytes = std::fs::read(artifact.path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(artifact.path(), &bytes).unwrap();

    let err = Predictor::from_file(artifact.path()).unwrap_err();
    assert!(matches!(err, StorecastError::SerializationError(_)), "{err}");
}

#[test]
fn test_save_to_unwritable_path_is_an_io_error() {
    let csv = write_sales_csv();
    let raw = SalesLoader::new().load_csv(csv.path()).unwrap();
    let engineered = features::engineer(&raw).unwrap();
    let (model, _) = Trainer::new(fast_config()).fit(&engineered).unwrap();

    let err = model.save("/nonexistent-dir/model.storecast").unwrap_err();
    assert!(matches!(err, StorecastError::IoError(_)), "{err}");
}

#[test]
fn test_loader_rejects_renamed_header() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "Shop,Date,Weekly_Sales,Holiday_Flag,Temperature,Fuel_Price,CPI,Unemployment"
    )
    .unwrap();
    writeln!(file, "1,05-02-2010,100.0,0,42.0,2.5,211.0,8.1").unwrap();

    let err = SalesLoader::new().load_csv(file.path()).unwrap_err();
    assert!(matches!(err, StorecastError::SchemaError(_)), "{err}");
}

#[test]
fn test_engineer_failure_reports_offending_value() {
    let df = df!(
        "Store" => &[1i64, 1],
        "Date" => &["05-02-2010", "02/05/2010"],
        "Weekly_Sales" => &[100.0, 200.0],
        "Holiday_Flag" => &[0i64, 0],
        "Temperature" => &[42.0, 41.0],
        "Fuel_Price" => &[2.5, 2.6],
        "CPI" => &[211.0, 211.1],
        "Unemployment" => &[8.1, 8.1]
    )
    .unwrap();

    let err = features::engineer(&df).unwrap_err();
    assert!(matches!(err, StorecastError::ParseError(_)), "{err}");
    assert!(err.to_string().contains("02/05/2010"), "{err}");
}
