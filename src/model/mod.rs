//! Trained model type and its on-disk artifact

pub mod artifact;

pub use artifact::{load_model, save_model, ModelArtifact, ModelMetadata};

use crate::error::Result;
use crate::training::boosting::GradientBoostedTrees;
use crate::training::metrics::RegressionMetrics;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Regression backend variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Regressor {
    GradientBoosted(GradientBoostedTrees),
}

impl Regressor {
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        match self {
            Regressor::GradientBoosted(model) => model.predict(x),
        }
    }

    pub fn predict_row(&self, sample: &[f64]) -> f64 {
        match self {
            Regressor::GradientBoosted(model) => model.predict_row(sample),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::GradientBoosted(_) => "gradient_boosted_trees",
        }
    }

    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            Regressor::GradientBoosted(model) => model.feature_importances(),
        }
    }
}

/// A trained sales forecaster.
///
/// Carries the fitted regressor together with the feature schema it was
/// trained on, so inference can validate and order its inputs without any
/// outside knowledge. Instances come from training or from [`SalesModel::load`];
/// there is no way to assemble one by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesModel {
    regressor: Regressor,
    feature_names: Vec<String>,
    target: String,
    metrics: RegressionMetrics,
    trained_at: String,
}

impl SalesModel {
    pub(crate) fn new(
        regressor: Regressor,
        feature_names: Vec<String>,
        target: String,
        metrics: RegressionMetrics,
    ) -> Self {
        Self {
            regressor,
            feature_names,
            target,
            metrics,
            trained_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn metrics(&self) -> &RegressionMetrics {
        &self.metrics
    }

    pub fn trained_at(&self) -> &str {
        &self.trained_at
    }

    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }

    /// Predict from a matrix whose columns follow [`Self::feature_names`]
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Array1<f64> {
        self.regressor.predict(x)
    }

    /// Predict one row laid out in [`Self::feature_names`] order
    pub fn predict_row(&self, sample: &[f64]) -> f64 {
        self.regressor.predict_row(sample)
    }

    /// Metadata block stored in the artifact next to the payload
    pub fn metadata(&self) -> ModelMetadata {
        let mut metadata = ModelMetadata::new("weekly_sales_forecaster")
            .with_trained_at(self.trained_at.clone())
            .with_model_type(self.regressor.kind())
            .with_features(self.feature_names.clone())
            .with_target(self.target.clone())
            .add_metric("r2", self.metrics.r2)
            .add_metric("mae", self.metrics.mae)
            .add_metric("rmse", self.metrics.rmse)
            .add_metric("mse", self.metrics.mse)
            .add_metric("n_train", self.metrics.n_train as f64)
            .add_metric("n_test", self.metrics.n_test as f64);

        let Regressor::GradientBoosted(model) = &self.regressor;
        let params = model.params();
        metadata = metadata
            .add_hyperparameter("n_estimators", params.n_estimators.to_string())
            .add_hyperparameter("learning_rate", params.learning_rate.to_string())
            .add_hyperparameter("max_depth", params.max_depth.to_string())
            .add_hyperparameter("min_child_weight", params.min_child_weight.to_string())
            .add_hyperparameter("reg_lambda", params.reg_lambda.to_string())
            .add_hyperparameter("reg_alpha", params.reg_alpha.to_string())
            .add_hyperparameter("gamma", params.gamma.to_string())
            .add_hyperparameter("subsample", params.subsample.to_string())
            .add_hyperparameter("colsample_bytree", params.colsample_bytree.to_string());
        if let Some(seed) = params.random_state {
            metadata = metadata.add_hyperparameter("seed", seed.to_string());
        }
        metadata
    }

    /// Save as a binary artifact
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        artifact::save_model(self, path, self.metadata())
    }

    /// Load from a binary artifact, verifying integrity
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let (model, _metadata) = artifact::load_model::<Self>(path)?;
        Ok(model)
    }
}
