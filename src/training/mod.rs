//! Model training
//!
//! [`Trainer`] takes an engineered frame, makes the seeded train/test split,
//! fits the boosted-tree regressor and reports hold-out metrics.

pub mod boosting;
pub mod config;
pub mod metrics;
pub mod trainer;

pub use boosting::{BoostingParams, GradientBoostedTrees};
pub use config::TrainConfig;
pub use metrics::RegressionMetrics;
pub use trainer::Trainer;
