//! Calendar feature engineering
//!
//! Turns the raw `Date` column into the numeric calendar features the model
//! trains on. The same [`calendar::DateParts`] decomposition backs both batch
//! engineering and single-point inference, so a date is never interpreted two
//! different ways.

pub mod calendar;
pub mod engineer;

pub use calendar::{DateParts, DATE_FORMAT};
pub use engineer::engineer;
