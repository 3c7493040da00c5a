//! Error types for the storecast pipeline

use thiserror::Error;

/// Result type alias for storecast operations
pub type Result<T> = std::result::Result<T, StorecastError>;

/// Main error type for the storecast pipeline
#[derive(Error, Debug)]
pub enum StorecastError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for StorecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        StorecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for StorecastError {
    fn from(err: serde_json::Error) -> Self {
        StorecastError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorecastError::SchemaError("missing column 'CPI'".to_string());
        assert_eq!(err.to_string(), "Schema error: missing column 'CPI'");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StorecastError = io_err.into();
        assert!(matches!(err, StorecastError::IoError(_)));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = StorecastError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: "1.5".to_string(),
            reason: "must be in (0, 1)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter: test_fraction = 1.5, must be in (0, 1)"
        );
    }
}
