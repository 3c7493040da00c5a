//! Training configuration

use crate::data::schema::WEEKLY_SALES;
use crate::error::{Result, StorecastError};
use serde::{Deserialize, Serialize};

/// Configuration for a training run.
///
/// Defaults reproduce the reference setup: 80/20 split, seed 42, and a
/// 200-tree booster with learning rate 0.1 and depth 6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Target column name
    pub target_column: String,
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the split and for row/column subsampling
    pub seed: u64,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split (gamma)
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            target_column: WEEKLY_SALES.to_string(),
            test_fraction: 0.2,
            seed: 42,
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_subsample(mut self, ratio: f64) -> Self {
        self.subsample = ratio;
        self
    }

    pub fn with_colsample_bytree(mut self, ratio: f64) -> Self {
        self.colsample_bytree = ratio;
        self
    }

    /// Validate parameter ranges before training starts
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(invalid("test_fraction", self.test_fraction, "must be in (0, 1)"));
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if self.learning_rate <= 0.0 {
            return Err(invalid("learning_rate", self.learning_rate, "must be positive"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", self.max_depth, "must be at least 1"));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(invalid("subsample", self.subsample, "must be in (0, 1]"));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(invalid("colsample_bytree", self.colsample_bytree, "must be in (0, 1]"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl std::fmt::Display, reason: &str) -> StorecastError {
    StorecastError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainConfig::default();
        assert_eq!(config.target_column, WEEKLY_SALES);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_estimators, 200);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.max_depth, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TrainConfig::new()
            .with_seed(7)
            .with_n_estimators(50)
            .with_test_fraction(0.25);
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_estimators, 50);
        assert_eq!(config.test_fraction, 0.25);
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let config = TrainConfig::new().with_test_fraction(1.0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StorecastError::InvalidParameter { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_estimators() {
        let config = TrainConfig::new().with_n_estimators(0);
        assert!(config.validate().is_err());
    }
}
