//! Storage format for timestamps.
//!
//! SQLite has no date-time type, so timestamps are stored as UTC text in a
//! fixed-width format. Lexicographic order of the stored text is then the same
//! as chronological order, which the range predicates and `ORDER BY` clauses
//! depend on.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

const SQL_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// A timestamp as it is read from and written to the database.
///
/// Any offset is normalised to UTC on write and values are read back as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SqlTimestamp(pub OffsetDateTime);

/// The current UTC time at the microsecond precision kept by the database.
///
/// Values created in memory then compare equal to the same values read back.
pub(crate) fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

impl ToSql for SqlTimestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let text = self
            .0
            .to_offset(UtcOffset::UTC)
            .format(SQL_TIMESTAMP_FORMAT)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(text))
    }
}

impl FromSql for SqlTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PrimitiveDateTime::parse(value.as_str()?, SQL_TIMESTAMP_FORMAT)
            .map(|date_time| Self(date_time.assume_utc()))
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
