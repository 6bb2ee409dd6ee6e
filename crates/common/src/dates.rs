//! Calendar helpers rendering the `YYYY-MM-DD` form the HRM date pickers accept

use chrono::{Datelike, Days, Local, NaiveDate};

/// Render a date as `YYYY-MM-DD` with zero-padded month and day.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Today's local date as `YYYY-MM-DD`.
pub fn current_date() -> String {
    format_date(today())
}

/// The date `days_ahead` days after today, as `YYYY-MM-DD`.
pub fn future_date(days_ahead: u64) -> String {
    format_date(future_date_from(today(), days_ahead))
}

/// The date exactly `days_ahead` days after `base`.
///
/// Saturates at `NaiveDate::MAX`.
pub fn future_date_from(base: NaiveDate, days_ahead: u64) -> NaiveDate {
    base.checked_add_days(Days::new(days_ahead))
        .unwrap_or(NaiveDate::MAX)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
