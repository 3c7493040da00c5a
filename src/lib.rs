//! storecast - Weekly retail sales forecasting
//!
//! A single-store-chain sales forecasting pipeline: load the raw weekly
//! sales CSV, derive calendar features from observation dates, train a
//! seeded gradient-boosted regressor, persist it as a verifiable binary
//! artifact and serve point predictions from it. A read-only exploration
//! layer provides the aggregations a dashboard needs.
//!
//! # Modules
//!
//! - [`data`] - CSV loading and the column contract
//! - [`features`] - Calendar feature engineering
//! - [`training`] - Seeded split, boosted-tree fitting, hold-out metrics
//! - [`model`] - Trained model type and its binary artifact
//! - [`inference`] - Schema-validated point and batch prediction
//! - [`explore`] - Read-only exploratory aggregations
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use storecast::data::SalesLoader;
//! use storecast::features;
//! use storecast::training::{TrainConfig, Trainer};
//! use storecast::inference::Predictor;
//!
//! # fn main() -> storecast::Result<()> {
//! let raw = SalesLoader::new().load_csv("walmart_sales.csv")?;
//! let engineered = features::engineer(&raw)?;
//! let (model, metrics) = Trainer::new(TrainConfig::default()).fit(&engineered)?;
//! println!("hold-out R² = {:.4}", metrics.r2);
//!
//! model.save("model.storecast")?;
//! let predictor = Predictor::from_file("model.storecast")?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Pipeline stages
pub mod data;
pub mod features;
pub mod training;
pub mod model;
pub mod inference;
pub mod explore;

// Services
pub mod cli;

pub use error::{Result, StorecastError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, StorecastError};

    // Data loading
    pub use crate::data::{SalesLoader, FEATURE_COLUMNS, RAW_COLUMNS};

    // Feature engineering
    pub use crate::features::{engineer, DateParts, DATE_FORMAT};

    // Training
    pub use crate::training::{RegressionMetrics, TrainConfig, Trainer};

    // Model and artifact
    pub use crate::model::{ModelMetadata, SalesModel};

    // Inference
    pub use crate::inference::{PredictionQuery, Predictor};

    // Exploration
    pub use crate::explore::{CorrelationMatrix, Histogram, StatsSummary, StoreMean};
}
