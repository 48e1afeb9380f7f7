//! SQL aggregation over a user's transactions in a time window.

use rusqlite::{Connection, params};

use crate::{
    Error, TransactionKind, UserId,
    statistics::{CategoryStatistics, KindTotals, MonthlyTrend},
    timestamp::SqlTimestamp,
    window::TimeWindow,
};

/// Sum and count the transactions of `kind` in `window`.
pub(super) fn kind_totals(
    user_id: UserId,
    kind: TransactionKind,
    window: &TimeWindow,
    connection: &Connection,
) -> Result<KindTotals, Error> {
    let totals = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM \"transaction\"
        WHERE user_id = ?1 AND kind = ?2 AND record_time >= ?3 AND record_time < ?4",
        params![
            user_id.as_i64(),
            kind,
            SqlTimestamp(window.start),
            SqlTimestamp(window.end)
        ],
        |row| {
            Ok(KindTotals {
                total: row.get(0)?,
                count: row.get(1)?,
            })
        },
    )?;

    Ok(totals)
}

/// Total the transactions in `window` per category.
///
/// Only categories with at least one transaction are included, largest total
/// first and then by category ID.
pub(super) fn category_breakdown(
    user_id: UserId,
    window: &TimeWindow,
    connection: &Connection,
) -> Result<Vec<CategoryStatistics>, Error> {
    connection
        .prepare(
            "SELECT category.id, category.name, category.kind, SUM(t.amount), COUNT(*)
            FROM \"transaction\" AS t
            INNER JOIN category ON category.id = t.category_id
            WHERE t.user_id = ?1 AND t.record_time >= ?2 AND t.record_time < ?3
            GROUP BY category.id, category.name, category.kind
            HAVING COUNT(*) > 0
            ORDER BY SUM(t.amount) DESC, category.id ASC",
        )?
        .query_map(
            params![
                user_id.as_i64(),
                SqlTimestamp(window.start),
                SqlTimestamp(window.end)
            ],
            |row| {
                Ok(CategoryStatistics {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    category_kind: row.get(2)?,
                    total: row.get(3)?,
                    count: row.get(4)?,
                })
            },
        )?
        .map(|maybe_stats| maybe_stats.map_err(|error| error.into()))
        .collect()
}

/// Compute income, expense and balance for `month` of `year`.
pub(super) fn monthly_trend(
    user_id: UserId,
    year: i32,
    month: i32,
    connection: &Connection,
) -> Result<MonthlyTrend, Error> {
    let window = TimeWindow::month(year, month)?;

    let (income, expense): (f64, f64) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
        FROM \"transaction\"
        WHERE user_id = ?1 AND record_time >= ?2 AND record_time < ?3",
        params![
            user_id.as_i64(),
            SqlTimestamp(window.start),
            SqlTimestamp(window.end)
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(MonthlyTrend {
        month: window.start.month().into(),
        income,
        expense,
        balance: income - expense,
    })
}
