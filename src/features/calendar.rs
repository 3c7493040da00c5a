//! Calendar decomposition of observation dates

use crate::error::{Result, StorecastError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format of the raw CSV, day first. This is a fixed input contract,
/// not a locale preference: `05-02-2010` is February 5th.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Calendar features derived from one observation date.
///
/// `week` follows the ISO-8601 week numbering, so a date near a year
/// boundary can belong to a week of the neighboring year while `year` stays
/// the calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub week: u32,
    pub day: u32,
    pub is_weekend: bool,
}

impl DateParts {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            week: date.iso_week().week(),
            day: date.day(),
            is_weekend: date.weekday().num_days_from_monday() >= 5,
        }
    }

    /// Parse a raw date string in [`DATE_FORMAT`]
    pub fn parse(raw: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| StorecastError::ParseError(format!("invalid date '{raw}': {e}")))?;
        Ok(Self::from_date(date))
    }
}
