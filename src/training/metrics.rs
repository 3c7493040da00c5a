//! Regression evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Hold-out metrics from one training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
    pub mse: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

impl RegressionMetrics {
    /// Compute R², MAE and RMSE over a hold-out set.
    ///
    /// With zero variance in `y_true` the R² ratio is undefined; it is
    /// reported as 0.0.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            r2,
            mae,
            rmse: mse.sqrt(),
            mse,
            n_train: 0,
            n_test: y_true.len(),
            training_time_secs: 0.0,
        }
    }
}
