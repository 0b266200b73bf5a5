//! Date helper functions

use chrono::NaiveDateTime;

/// Human-readable date (like "January 5, 2024")
pub fn long_date(date: &NaiveDateTime) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Date in `YYYY-MM-DD` form
pub fn iso_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d").to_string()
}
