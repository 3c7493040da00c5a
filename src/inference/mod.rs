//! Point and batch prediction against a trained model
//!
//! [`Predictor`] wraps a [`SalesModel`] handed to it explicitly, either
//! in-memory or loaded from an artifact file. Input schema is validated
//! against the model's own feature list before any prediction runs: a
//! missing column and an unexpected column are both hard failures.

use crate::data::schema::{self, CPI, FUEL_PRICE, HOLIDAY_FLAG, STORE, TEMPERATURE, UNEMPLOYMENT};
use crate::data::schema::{DAY, IS_WEEKEND, MONTH, WEEK, YEAR};
use crate::error::{Result, StorecastError};
use crate::features::DateParts;
use crate::model::SalesModel;
use chrono::NaiveDate;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// One forecast request in raw terms: identifying store, date and the
/// economic indicators for that week. Calendar features are derived from
/// `date` with the same rules used at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub store: i64,
    pub date: NaiveDate,
    pub holiday_flag: bool,
    pub temperature: f64,
    pub fuel_price: f64,
    pub cpi: f64,
    pub unemployment: f64,
}

impl PredictionQuery {
    fn feature_value(&self, parts: &DateParts, name: &str) -> Option<f64> {
        match name {
            STORE => Some(self.store as f64),
            HOLIDAY_FLAG => Some(if self.holiday_flag { 1.0 } else { 0.0 }),
            TEMPERATURE => Some(self.temperature),
            FUEL_PRICE => Some(self.fuel_price),
            CPI => Some(self.cpi),
            UNEMPLOYMENT => Some(self.unemployment),
            YEAR => Some(parts.year as f64),
            MONTH => Some(parts.month as f64),
            WEEK => Some(parts.week as f64),
            DAY => Some(parts.day as f64),
            IS_WEEKEND => Some(if parts.is_weekend { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// Prediction service over one trained model
#[derive(Debug)]
pub struct Predictor {
    model: SalesModel,
}

impl Predictor {
    /// Wrap an in-memory model
    pub fn new(model: SalesModel) -> Self {
        Self { model }
    }

    /// Load a model artifact and wrap it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(SalesModel::load(path)?))
    }

    pub fn model(&self) -> &SalesModel {
        &self.model
    }

    /// Predict weekly sales for every row of a feature frame.
    ///
    /// The frame must carry exactly the model's feature columns; order does
    /// not matter, columns are gathered by name.
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        self.validate_columns(df)?;
        let x = schema::columns_to_matrix(df, self.model.feature_names())?;
        debug!(rows = df.height(), "running batch prediction");
        Ok(self.model.predict_matrix(&x))
    }

    /// Predict weekly sales for a single query
    pub fn predict_one(&self, query: &PredictionQuery) -> Result<f64> {
        let parts = DateParts::from_date(query.date);
        let sample: Vec<f64> = self
            .model
            .feature_names()
            .iter()
            .map(|name| {
                query.feature_value(&parts, name).ok_or_else(|| {
                    StorecastError::SchemaMismatch(format!(
                        "model expects feature '{name}' which a prediction query cannot supply"
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(self.model.predict_row(&sample))
    }

    fn validate_columns(&self, df: &DataFrame) -> Result<()> {
        let got: HashSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let expected: HashSet<String> = self.model.feature_names().iter().cloned().collect();

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
        Err(StorecastError::SchemaMismatch(parts.join(", ")))
    }
}
