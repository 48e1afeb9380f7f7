//! Half-open time windows used by list filters and statistics.
//!
//! Every window is `[start, end)`: it includes `start` and excludes `end`, so
//! adjacent days, months and years never count a transaction twice.

use time::{
    Date, Month, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The earliest year accepted by the statistics queries.
pub const MIN_YEAR: i32 = 1900;
/// The latest year accepted by the statistics queries.
pub const MAX_YEAR: i32 = 2100;

/// A half-open range of UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// The first instant in the window.
    pub start: OffsetDateTime,
    /// The first instant after the window.
    pub end: OffsetDateTime,
}

impl TimeWindow {
    /// The window covering calendar `month` (1-12) of `year` in UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if `year` is outside of
    /// [MIN_YEAR]..=[MAX_YEAR] or `month` is outside of 1..=12.
    pub fn month(year: i32, month: i32) -> Result<Self, Error> {
        validate_year(year)?;
        let month = parse_month(month)?;

        let (next_year, next_month) = match month {
            Month::December => (year + 1, Month::January),
            month => (year, month.next()),
        };

        Ok(Self {
            start: first_of_month(year, month)?,
            end: first_of_month(next_year, next_month)?,
        })
    }

    /// The window covering the whole of `year` in UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if `year` is outside of
    /// [MIN_YEAR]..=[MAX_YEAR].
    pub fn year(year: i32) -> Result<Self, Error> {
        validate_year(year)?;

        Ok(Self {
            start: first_of_month(year, Month::January)?,
            end: first_of_month(year + 1, Month::January)?,
        })
    }
}

/// Check that `year` is in the range accepted by the statistics queries.
pub fn validate_year(year: i32) -> Result<(), Error> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "year {year} is outside of the range {MIN_YEAR} to {MAX_YEAR}"
        )))
    }
}

fn parse_month(month: i32) -> Result<Month, Error> {
    u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .ok_or_else(|| {
            Error::InvalidArgument(format!("month {month} is outside of the range 1 to 12"))
        })
}

fn first_of_month(year: i32, month: Month) -> Result<OffsetDateTime, Error> {
    Date::from_calendar_date(year, month, 1)
        .map(start_of_day)
        .map_err(|error| Error::InvalidArgument(format!("invalid date: {error}")))
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

/// Midnight UTC at the start of the day after `date`.
///
/// Used as the exclusive upper bound for an inclusive end date. Returns `None`
/// for the last representable date.
pub fn start_of_next_day(date: Date) -> Option<OffsetDateTime> {
    date.next_day().map(start_of_day)
}

/// Parse a `YYYY-MM-DD` date string.
///
/// Blank or malformed strings yield `None`, meaning "no bound".
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    match Date::parse(text, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!("Ignoring malformed date \"{text}\": {error}");
            None
        }
    }
}
