//! Training orchestration: validate, split, fit, evaluate

use crate::data::schema::{self, FEATURE_COLUMNS};
use crate::error::{Result, StorecastError};
use crate::model::{Regressor, SalesModel};
use crate::training::boosting::{BoostingParams, GradientBoostedTrees};
use crate::training::config::TrainConfig;
use crate::training::metrics::RegressionMetrics;
use ndarray::Axis;
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Trains a sales forecaster from an engineered frame.
///
/// The input must be the output of feature engineering: the eleven model
/// input columns plus the target. Anything else fails before any work is
/// done. The train/test partition is a seeded shuffle, so a config with the
/// same seed always produces the same split, the same model and the same
/// metrics.
pub struct Trainer {
    config: TrainConfig,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainConfig::default())
    }
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Fit on an engineered frame and evaluate on the held-out fraction
    pub fn fit(&self, df: &DataFrame) -> Result<(SalesModel, RegressionMetrics)> {
        let start = Instant::now();
        self.config.validate()?;
        validate_training_frame(df, &self.config.target_column)?;

        let feature_names: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
        let x = schema::columns_to_matrix(df, &feature_names)?;
        let y = schema::column_to_vec(df, &self.config.target_column)?;

        let (train_idx, test_idx) =
            split_indices(df.height(), self.config.test_fraction, self.config.seed)?;
        let x_train = x.select(Axis(0), &train_idx);
        let y_train = y.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_test = y.select(Axis(0), &test_idx);

        info!(
            n_train = train_idx.len(),
            n_test = test_idx.len(),
            n_features = feature_names.len(),
            seed = self.config.seed,
            "fitting gradient-boosted trees"
        );

        let mut regressor = GradientBoostedTrees::new(self.boosting_params());
        regressor.fit(&x_train, &y_train)?;

        let y_pred = regressor.predict(&x_test);
        let mut metrics = RegressionMetrics::compute(&y_test, &y_pred);
        metrics.n_train = train_idx.len();
        metrics.n_test = test_idx.len();
        metrics.training_time_secs = start.elapsed().as_secs_f64();

        info!(
            r2 = metrics.r2,
            mae = metrics.mae,
            rmse = metrics.rmse,
            "training complete"
        );

        let model = SalesModel::new(
            Regressor::GradientBoosted(regressor),
            feature_names,
            self.config.target_column.clone(),
            metrics.clone(),
        );
        Ok((model, metrics))
    }

    fn boosting_params(&self) -> BoostingParams {
        BoostingParams {
            n_estimators: self.config.n_estimators,
            learning_rate: self.config.learning_rate,
            max_depth: self.config.max_depth,
            min_child_weight: self.config.min_child_weight,
            reg_lambda: self.config.reg_lambda,
            reg_alpha: self.config.reg_alpha,
            gamma: self.config.gamma,
            subsample: self.config.subsample,
            colsample_bytree: self.config.colsample_bytree,
            random_state: Some(self.config.seed),
        }
    }
}

/// The training frame must carry exactly the model inputs plus the target
fn validate_training_frame(df: &DataFrame, target: &str) -> Result<()> {
    if df.height() == 0 {
        return Err(StorecastError::SchemaError(
            "training frame has no rows".to_string(),
        ));
    }

    let got: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let mut expected: HashSet<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    expected.insert(target.to_string());

    if got == expected {
        return Ok(());
    }

    let mut missing: Vec<&String> = expected.difference(&got).collect();
    let mut unexpected: Vec<&String> = got.difference(&expected).collect();
    missing.sort();
    unexpected.sort();

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing columns {:?}", missing));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected columns {:?}", unexpected));
    }
    Err(StorecastError::SchemaError(format!(
        "training frame does not match the engineered schema: {}",
        parts.join(", ")
    )))
}

/// Seeded shuffled partition into train and test row indices.
///
/// The test size truncates, matching `floor(n * test_fraction)`. Both sides
/// must end up non-empty.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    let n_test = (n as f64 * test_fraction) as usize;
    if n_test == 0 || n_test >= n {
        return Err(StorecastError::SchemaError(format!(
            "cannot hold out a test set from {n} rows with test_fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_idx = indices.split_off(n - n_test);
    Ok((indices, test_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::WEEKLY_SALES;

    fn engineered_df(n: usize) -> DataFrame {
        let rows: Vec<f64> = (0..n).map(|i| i as f64).collect();
        df!(
            "Store" => rows.iter().map(|i| (*i as i64 % 3) + 1).collect::<Vec<i64>>(),
            WEEKLY_SALES => rows.iter().map(|i| 1000.0 + 50.0 * i + (*i % 7.0) * 10.0).collect::<Vec<f64>>(),
            "Holiday_Flag" => rows.iter().map(|i| (*i as i64) % 10 == 0).map(i64::from).collect::<Vec<i64>>(),
            "Temperature" => rows.iter().map(|i| 40.0 + i % 30.0).collect::<Vec<f64>>(),
            "Fuel_Price" => rows.iter().map(|i| 2.5 + i * 0.01).collect::<Vec<f64>>(),
            "CPI" => rows.iter().map(|i| 210.0 + i * 0.1).collect::<Vec<f64>>(),
            "Unemployment" => rows.iter().map(|i| 8.0 - i * 0.01).collect::<Vec<f64>>(),
            "Year" => rows.iter().map(|i| 2010 + (*i as i32 / 52)).collect::<Vec<i32>>(),
            "Month" => rows.iter().map(|i| (*i as i32 % 12) + 1).collect::<Vec<i32>>(),
            "Week" => rows.iter().map(|i| (*i as i32 % 52) + 1).collect::<Vec<i32>>(),
            "Day" => rows.iter().map(|i| (*i as i32 % 28) + 1).collect::<Vec<i32>>(),
            "Is_Weekend" => rows.iter().map(|i| (*i as i64) % 7 >= 5).collect::<Vec<bool>>()
        )
        .unwrap()
    }

    fn fast_config() -> TrainConfig {
        TrainConfig::new().with_n_estimators(20).with_max_depth(3)
    }

    #[test]
    fn test_fit_produces_model_and_metrics() {
        let df = engineered_df(60);
        let (model, metrics) = Trainer::new(fast_config()).fit(&df).unwrap();
        assert_eq!(model.feature_names().len(), 11);
        assert_eq!(metrics.n_train, 48);
        assert_eq!(metrics.n_test, 12);
        assert!(metrics.r2.is_finite());
        assert!(metrics.rmse >= 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let df = engineered_df(60);
        let (_, m1) = Trainer::new(fast_config()).fit(&df).unwrap();
        let (_, m2) = Trainer::new(fast_config()).fit(&df).unwrap();
        assert_eq!(m1.r2, m2.r2);
        assert_eq!(m1.mae, m2.mae);
        assert_eq!(m1.rmse, m2.rmse);
    }

    #[test]
    fn test_seed_changes_split() {
        let (a_train, _) = split_indices(100, 0.2, 42).unwrap();
        let (b_train, _) = split_indices(100, 0.2, 43).unwrap();
        assert_ne!(a_train, b_train);
    }

    #[test]
    fn test_split_sizes_truncate() {
        let (train, test) = split_indices(101, 0.2, 42).unwrap();
        assert_eq!(test.len(), 20);
        assert_eq!(train.len(), 81);
    }

    #[test]
    fn test_split_is_a_partition() {
        let (train, test) = split_indices(50, 0.2, 42).unwrap();
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<usize>>());
    }

    #[test]
    fn test_fit_rejects_empty_frame() {
        let df = engineered_df(60);
        let empty = df.slice(0, 0);
        let err = Trainer::new(fast_config()).fit(&empty).unwrap_err();
        assert!(matches!(err, StorecastError::SchemaError(_)));
    }

    #[test]
    fn test_fit_rejects_missing_target() {
        let df = engineered_df(60).drop(WEEKLY_SALES).unwrap();
        let err = Trainer::new(fast_config()).fit(&df).unwrap_err();
        assert!(err.to_string().contains(WEEKLY_SALES), "{err}");
    }

    #[test]
    fn test_fit_rejects_stray_column() {
        let mut df = engineered_df(60);
        df.with_column(Column::new("Stray".into(), vec![0.0; 60])).unwrap();
        let err = Trainer::new(fast_config()).fit(&df).unwrap_err();
        assert!(err.to_string().contains("Stray"), "{err}");
    }

    #[test]
    fn test_fit_rejects_too_few_rows() {
        let df = engineered_df(3);
        let err = Trainer::new(fast_config()).fit(&df).unwrap_err();
        assert!(matches!(err, StorecastError::SchemaError(_)));
    }
}
