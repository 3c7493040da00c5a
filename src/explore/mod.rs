//! Read-only exploratory aggregations
//!
//! Everything a presentation layer needs to chart the dataset: per-store
//! averages, chronological store trends, monthly distributions, a Pearson
//! correlation matrix, column summaries and histograms. All functions take
//! the frame by reference and never mutate it.

use crate::data::schema::{DATE, STORE, WEEKLY_SALES};
use crate::error::{Result, StorecastError};
use crate::features::DateParts;
use chrono::NaiveDate;
use ndarray::ArrayView1;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Mean weekly sales for one store
#[derive(Debug, Clone, Serialize)]
pub struct StoreMean {
    pub store: i64,
    pub mean_sales: f64,
    pub n_weeks: usize,
}

/// One observation in a store's chronological trend
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub weekly_sales: f64,
}

/// Sales distribution for one calendar month across all years
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub month: u32,
    pub stats: StatsSummary,
}

/// Distribution summary of a numeric column
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub std_dev: f64,
    pub sum: f64,
}

impl StatsSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len() as u64;
        let sum: f64 = values.iter().sum();
        let avg = sum / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let variance: f64 =
            values.iter().map(|&x| (x - avg).powi(2)).sum::<f64>() / count as f64;
        let std_dev = variance.sqrt();

        Self {
            count,
            min,
            max,
            avg,
            std_dev,
            sum,
        }
    }
}

/// Pairwise Pearson correlations over the numeric columns of a frame
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Equal-width histogram of a numeric column
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    /// `n_bins + 1` boundaries, first = min, last = max
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Mean weekly sales per store, ordered by store id
pub fn store_means(df: &DataFrame) -> Result<Vec<StoreMean>> {
    let stores = int_column(df, STORE)?;
    let sales = float_column(df, WEEKLY_SALES)?;

    let mut sums: HashMap<i64, (f64, usize)> = HashMap::new();
    for (store, value) in stores.iter().zip(sales.iter()) {
        let entry = sums.entry(*store).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut means: Vec<StoreMean> = sums
        .into_iter()
        .map(|(store, (sum, n))| StoreMean {
            store,
            mean_sales: sum / n as f64,
            n_weeks: n,
        })
        .collect();
    means.sort_by_key(|m| m.store);
    Ok(means)
}

/// Weekly sales of one store in date order.
///
/// Operates on the raw frame; dates are parsed here because the engineered
/// frame no longer carries them.
pub fn store_trend(df: &DataFrame, store: i64) -> Result<Vec<TrendPoint>> {
    let stores = int_column(df, STORE)?;
    let sales = float_column(df, WEEKLY_SALES)?;
    let dates = date_column(df)?;

    let mut points: Vec<TrendPoint> = stores
        .iter()
        .zip(dates.iter())
        .zip(sales.iter())
        .filter(|((s, _), _)| **s == store)
        .map(|((_, date), value)| TrendPoint {
            date: *date,
            weekly_sales: *value,
        })
        .collect();

    if points.is_empty() {
        return Err(StorecastError::DataError(format!(
            "no rows for store {store}"
        )));
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// Weekly sales distribution per calendar month, pooled across years
pub fn monthly_stats(df: &DataFrame) -> Result<Vec<MonthlyStats>> {
    let sales = float_column(df, WEEKLY_SALES)?;
    let dates = date_column(df)?;

    let mut buckets: HashMap<u32, Vec<f64>> = HashMap::new();
    for (date, value) in dates.iter().zip(sales.iter()) {
        buckets
            .entry(DateParts::from_date(*date).month)
            .or_default()
            .push(*value);
    }

    let mut months: Vec<MonthlyStats> = buckets
        .into_iter()
        .map(|(month, values)| MonthlyStats {
            month,
            stats: StatsSummary::from_values(&values),
        })
        .collect();
    months.sort_by_key(|m| m.month);
    Ok(months)
}

/// Pearson correlation matrix over every non-string column.
///
/// The raw `Date` column is skipped; run the frame through feature
/// engineering first to correlate calendar features.
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| !matches!(c.dtype(), DataType::String))
        .map(|c| c.name().to_string())
        .collect();

    if columns.is_empty() {
        return Err(StorecastError::DataError(
            "no numeric columns to correlate".to_string(),
        ));
    }

    let x = crate::data::schema::columns_to_matrix(df, &columns)?;
    let k = columns.len();
    let mut values = vec![vec![0.0f64; k]; k];

    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson_correlation(x.column(i), x.column(j));
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

/// Distribution summary of one numeric column
pub fn summarize(df: &DataFrame, column: &str) -> Result<StatsSummary> {
    let values = float_column(df, column)?;
    Ok(StatsSummary::from_values(&values))
}

/// Equal-width histogram of one numeric column
pub fn histogram(df: &DataFrame, column: &str, n_bins: usize) -> Result<Histogram> {
    if n_bins == 0 {
        return Err(StorecastError::InvalidParameter {
            name: "n_bins".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let values = float_column(df, column)?;
    if values.is_empty() {
        return Err(StorecastError::DataError(format!(
            "column '{column}' has no values to bin"
        )));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / n_bins as f64
    } else {
        1.0
    };

    let edges: Vec<f64> = (0..=n_bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0usize; n_bins];
    for &v in &values {
        let mut bin = ((v - min) / width) as usize;
        if bin >= n_bins {
            bin = n_bins - 1;
        }
        counts[bin] += 1;
    }

    Ok(Histogram { edges, counts })
}

fn pearson_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sum_xy += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denom = (sum_x2 * sum_y2).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        sum_xy / denom
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| StorecastError::FeatureNotFound(name.to_string()))?;
    let column_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| StorecastError::DataError(e.to_string()))?;
    reject_nulls(&column_f64, name)?;
    Ok(column_f64
        .f64()
        .map_err(|e| StorecastError::DataError(e.to_string()))?
        .into_iter()
        .flatten()
        .collect())
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = df
        .column(name)
        .map_err(|_| StorecastError::FeatureNotFound(name.to_string()))?;
    let column_i64 = column
        .cast(&DataType::Int64)
        .map_err(|e| StorecastError::DataError(e.to_string()))?;
    reject_nulls(&column_i64, name)?;
    Ok(column_i64
        .i64()
        .map_err(|e| StorecastError::DataError(e.to_string()))?
        .into_iter()
        .flatten()
        .collect())
}

// A null aggregated as zero would silently distort every mean and
// correlation, so it fails instead.
fn reject_nulls(column: &Column, name: &str) -> Result<()> {
    let nulls = column.null_count();
    if nulls > 0 {
        return Err(StorecastError::DataError(format!(
            "column '{name}' has {nulls} null values"
        )));
    }
    Ok(())
}

fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let raw = df
        .column(DATE)
        .map_err(|_| StorecastError::FeatureNotFound(DATE.to_string()))?
        .str()
        .map_err(|_| {
            StorecastError::SchemaError(format!("column '{DATE}' must contain strings"))
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw = value
                .ok_or_else(|| StorecastError::ParseError(format!("row {row}: missing date")))?;
            NaiveDate::parse_from_str(raw, crate::features::DATE_FORMAT)
                .map_err(|e| StorecastError::ParseError(format!("row {row}: invalid date '{raw}': {e}")))
        })
        .collect()
}
