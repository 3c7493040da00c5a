//! Batch feature engineering on the raw sales frame

use crate::data::schema::{DATE, DAY, IS_WEEKEND, MONTH, WEEK, YEAR};
use crate::error::{Result, StorecastError};
use crate::features::calendar::DateParts;
use polars::prelude::*;

/// Derive calendar features for every row of a raw sales frame.
///
/// The `Date` column is parsed, replaced by five derived columns
/// (`Year`, `Month`, `Week`, `Day`, `Is_Weekend`) and dropped. Row order is
/// preserved and no other column is touched. One unparseable date fails the
/// whole batch; a partially engineered frame is never returned.
pub fn engineer(df: &DataFrame) -> Result<DataFrame> {
    let dates = df
        .column(DATE)
        .map_err(|_| StorecastError::SchemaError(format!("missing required column '{DATE}'")))?
        .str()
        .map_err(|_| {
            StorecastError::SchemaError(format!("column '{DATE}' must contain strings"))
        })?;

    let n = df.height();
    let mut years: Vec<i32> = Vec::with_capacity(n);
    let mut months: Vec<i32> = Vec::with_capacity(n);
    let mut weeks: Vec<i32> = Vec::with_capacity(n);
    let mut days: Vec<i32> = Vec::with_capacity(n);
    let mut weekends: Vec<bool> = Vec::with_capacity(n);

    for (row, value) in dates.into_iter().enumerate() {
        let raw = value
            .ok_or_else(|| StorecastError::ParseError(format!("row {row}: missing date")))?;
        let parts = DateParts::parse(raw).map_err(|e| match e {
            StorecastError::ParseError(msg) => {
                StorecastError::ParseError(format!("row {row}: {msg}"))
            }
            other => other,
        })?;
        years.push(parts.year);
        months.push(parts.month as i32);
        weeks.push(parts.week as i32);
        days.push(parts.day as i32);
        weekends.push(parts.is_weekend);
    }

    let mut out = df.drop(DATE)?;
    out.with_column(Column::new(YEAR.into(), years))?;
    out.with_column(Column::new(MONTH.into(), months))?;
    out.with_column(Column::new(WEEK.into(), weeks))?;
    out.with_column(Column::new(DAY.into(), days))?;
    out.with_column(Column::new(IS_WEEKEND.into(), weekends))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{STORE, WEEKLY_SALES};

    fn raw_df() -> DataFrame {
        df!(
            STORE => &[1i64, 1, 2],
            DATE => &["01-01-2021", "02-01-2021", "08-01-2021"],
            WEEKLY_SALES => &[1643690.9, 1641957.44, 1611968.17]
        )
        .unwrap()
    }

    #[test]
    fn test_engineer_appends_calendar_columns() {
        let out = engineer(&raw_df()).unwrap();
        let names: Vec<String> = out
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            vec![STORE, WEEKLY_SALES, YEAR, MONTH, WEEK, DAY, IS_WEEKEND]
        );
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_engineer_values() {
        let out = engineer(&raw_df()).unwrap();
        let years = out.column(YEAR).unwrap().i32().unwrap();
        let weekends = out.column(IS_WEEKEND).unwrap().bool().unwrap();
        assert_eq!(years.get(0), Some(2021));
        // Friday, Saturday, Friday
        assert_eq!(weekends.get(0), Some(false));
        assert_eq!(weekends.get(1), Some(true));
        assert_eq!(weekends.get(2), Some(false));
    }

    #[test]
    fn test_engineer_preserves_row_order() {
        let out = engineer(&raw_df()).unwrap();
        let days = out.column(DAY).unwrap().i32().unwrap();
        assert_eq!(days.get(0), Some(1));
        assert_eq!(days.get(1), Some(2));
        assert_eq!(days.get(2), Some(8));
    }

    #[test]
    fn test_engineer_is_deterministic() {
        let first = engineer(&raw_df()).unwrap();
        let second = engineer(&raw_df()).unwrap();
        for name in [YEAR, MONTH, WEEK, DAY] {
            let a = first.column(name).unwrap().i32().unwrap();
            let b = second.column(name).unwrap().i32().unwrap();
            assert!(a.into_iter().zip(b).all(|(x, y)| x == y), "{name} differs");
        }
    }

    #[test]
    fn test_engineer_aborts_batch_on_bad_date() {
        let df = df!(
            STORE => &[1i64, 1],
            DATE => &["01-01-2021", "2021-01-08"],
            WEEKLY_SALES => &[1.0, 2.0]
        )
        .unwrap();
        let err = engineer(&df).unwrap_err();
        assert!(matches!(err, StorecastError::ParseError(_)));
        assert!(err.to_string().contains("row 1"), "{err}");
        assert!(err.to_string().contains("2021-01-08"), "{err}");
    }

    #[test]
    fn test_engineer_requires_date_column() {
        let df = df!(STORE => &[1i64]).unwrap();
        let err = engineer(&df).unwrap_err();
        assert!(matches!(err, StorecastError::SchemaError(_)));
    }
}
