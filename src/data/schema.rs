//! Column contract for the weekly sales dataset

use crate::error::{Result, StorecastError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::HashSet;

pub const STORE: &str = "Store";
pub const DATE: &str = "Date";
pub const WEEKLY_SALES: &str = "Weekly_Sales";
pub const HOLIDAY_FLAG: &str = "Holiday_Flag";
pub const TEMPERATURE: &str = "Temperature";
pub const FUEL_PRICE: &str = "Fuel_Price";
pub const CPI: &str = "CPI";
pub const UNEMPLOYMENT: &str = "Unemployment";
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const WEEK: &str = "Week";
pub const DAY: &str = "Day";
pub const IS_WEEKEND: &str = "Is_Weekend";

/// Columns a raw sales CSV must carry, in file order.
pub const RAW_COLUMNS: [&str; 8] = [
    STORE,
    DATE,
    WEEKLY_SALES,
    HOLIDAY_FLAG,
    TEMPERATURE,
    FUEL_PRICE,
    CPI,
    UNEMPLOYMENT,
];

/// Model input columns in training order. Every trained model predicts from
/// exactly this set.
pub const FEATURE_COLUMNS: [&str; 11] = [
    STORE,
    HOLIDAY_FLAG,
    TEMPERATURE,
    FUEL_PRICE,
    CPI,
    UNEMPLOYMENT,
    YEAR,
    MONTH,
    WEEK,
    DAY,
    IS_WEEKEND,
];

/// Check that `df` carries exactly the raw CSV columns.
///
/// Order is not enforced; the set is. Missing and unexpected columns are both
/// reported so a renamed header shows up as one error, not two runs.
pub fn validate_raw_columns(df: &DataFrame) -> Result<()> {
    let got: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let expected: HashSet<String> = RAW_COLUMNS.iter().map(|s| s.to_string()).collect();

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

    Err(StorecastError::SchemaError(parts.join(", ")))
}

/// Extract a single column as a dense `Array1<f64>`, casting if needed.
///
/// Null cells are a hard failure: a null must never reach the model as a
/// fabricated zero.
pub fn column_to_vec(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = df
        .column(name)
        .map_err(|_| StorecastError::FeatureNotFound(name.to_string()))?;
    let column_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| StorecastError::DataError(e.to_string()))?;
    reject_nulls(&column_f64, name)?;
    let values: Array1<f64> = column_f64
        .f64()
        .map_err(|e| StorecastError::DataError(e.to_string()))?
        .into_iter()
        .flatten()
        .collect();
    Ok(values)
}

fn reject_nulls(column: &Column, name: &str) -> Result<()> {
    let nulls = column.null_count();
    if nulls > 0 {
        return Err(StorecastError::DataError(format!(
            "column '{name}' has {nulls} null values"
        )));
    }
    Ok(())
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Uses `Array2::from_shape_fn` for cache-friendly construction from
/// column-major Polars data.
pub fn columns_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| StorecastError::FeatureNotFound(col_name.clone()))?;
            let column_f64 = column
                .cast(&DataType::Float64)
                .map_err(|e| StorecastError::DataError(e.to_string()))?;
            reject_nulls(&column_f64, col_name)?;
            let values: Vec<f64> = column_f64
                .f64()
                .map_err(|e| StorecastError::DataError(e.to_string()))?
                .into_iter()
                .flatten()
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}
