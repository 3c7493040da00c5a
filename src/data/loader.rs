//! Loading the raw weekly sales CSV

use crate::data::schema::{self, DATE, RAW_COLUMNS, STORE};
use crate::error::{Result, StorecastError};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Loader for the raw weekly sales CSV.
///
/// The file must have a header row matching [`RAW_COLUMNS`]. Numeric types
/// are inferred; `Date` stays a string column until feature engineering
/// parses it.
pub struct SalesLoader {
    infer_schema_rows: Option<usize>,
}

impl Default for SalesLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SalesLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_rows: Some(100),
        }
    }

    /// Load and validate a sales CSV.
    ///
    /// A missing or unreadable file is an IO error; a header that does not
    /// match the expected column set is a schema error. Repeated
    /// `(Store, Date)` pairs and null cells are reported as warnings here;
    /// nulls become hard failures when the frame is lowered to the numeric
    /// matrix for training or inference.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            StorecastError::IoError(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_rows)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| StorecastError::DataError(e.to_string()))?;

        schema::validate_raw_columns(&df)?;
        warn_on_duplicate_keys(&df)?;
        warn_on_nulls(&df);

        Ok(df)
    }
}

/// Each `(Store, Date)` pair is expected to appear once. Duplicates are a
/// data-quality smell but the pipeline still trains on them.
fn warn_on_duplicate_keys(df: &DataFrame) -> Result<()> {
    let stores = df
        .column(STORE)?
        .cast(&DataType::Int64)
        .map_err(|e| StorecastError::SchemaError(format!("column '{STORE}': {e}")))?;
    let stores = stores
        .i64()
        .map_err(|e| StorecastError::SchemaError(format!("column '{STORE}': {e}")))?;
    let dates = df
        .column(DATE)?
        .str()
        .map_err(|e| StorecastError::SchemaError(format!("column '{DATE}': {e}")))?;

    let mut seen: HashSet<(i64, &str)> = HashSet::with_capacity(df.height());
    let mut duplicates = 0usize;
    let mut first: Option<(i64, String)> = None;
    for (store, date) in stores.into_iter().zip(dates.into_iter()) {
        if let (Some(store), Some(date)) = (store, date) {
            if !seen.insert((store, date)) {
                duplicates += 1;
                if first.is_none() {
                    first = Some((store, date.to_string()));
                }
            }
        }
    }

    if let Some((store, date)) = first {
        warn!(
            duplicates,
            store,
            date = %date,
            "repeated (Store, Date) pairs in input data"
        );
    }
    Ok(())
}

fn warn_on_nulls(df: &DataFrame) {
    for name in RAW_COLUMNS {
        if let Ok(column) = df.column(name) {
            let nulls = column.null_count();
            if nulls > 0 {
                warn!(column = name, nulls, "null values in input data");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "Store,Date,Weekly_Sales,Holiday_Flag,Temperature,Fuel_Price,CPI,Unemployment"
        )
        .unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_csv(&[
            "1,05-02-2010,1643690.90,0,42.31,2.572,211.096,8.106",
            "1,12-02-2010,1641957.44,1,38.51,2.548,211.242,8.106",
        ]);
        let df = SalesLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8);
    }

    #[test]
    fn test_load_csv_rejects_wrong_header() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Shop,Date,Sales").unwrap();
        writeln!(file, "1,05-02-2010,10.0").unwrap();

        let err = SalesLoader::new().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, StorecastError::SchemaError(_)), "{err}");
    }

    #[test]
    fn test_load_csv_missing_file_is_an_io_error() {
        let err = SalesLoader::new().load_csv("/nonexistent/sales.csv").unwrap_err();
        assert!(matches!(err, StorecastError::IoError(_)), "{err}");
        assert!(err.to_string().contains("sales.csv"), "{err}");
    }

    #[test]
    fn test_load_csv_tolerates_duplicate_keys() {
        let file = write_csv(&[
            "1,05-02-2010,1643690.90,0,42.31,2.572,211.096,8.106",
            "1,05-02-2010,1641957.44,0,38.51,2.548,211.242,8.106",
        ]);
        // Duplicates warn but the frame still loads in full.
        let df = SalesLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
    }
}
