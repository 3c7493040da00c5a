//! Raw dataset loading and the column contract

pub mod loader;
pub mod schema;

pub use loader::SalesLoader;
pub use schema::{columns_to_matrix, validate_raw_columns, FEATURE_COLUMNS, RAW_COLUMNS};
