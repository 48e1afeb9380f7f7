//! Monthly and yearly statistics over a user's transactions.
//!
//! All figures are computed on demand from the transaction table over
//! half-open UTC windows, nothing is cached or persisted. Windows with no
//! transactions produce zero totals and empty breakdowns.

mod aggregation;
mod endpoint;

pub use endpoint::{monthly_statistics_endpoint, yearly_statistics_endpoint};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, Error, TransactionKind, UserId, window::TimeWindow};

use aggregation::{category_breakdown, kind_totals, monthly_trend};

/// The summed amount and number of transactions of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindTotals {
    /// The sum of the amounts, zero if there are no transactions.
    pub total: f64,
    /// The number of transactions.
    pub count: u64,
}

/// The totals for a single category within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    /// The ID of the category.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The kind of the category and therefore of its transactions.
    pub category_kind: TransactionKind,
    /// The sum of the amounts filed under the category.
    pub total: f64,
    /// The number of transactions filed under the category, at least one.
    pub count: u64,
}

/// Income, expense and balance for one month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// The month of the year, 1 to 12.
    pub month: u8,
    /// Total income for the month.
    pub income: f64,
    /// Total expenses for the month.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

/// A summary of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatistics {
    /// The year.
    pub year: i32,
    /// The month of the year, 1 to 12.
    pub month: u8,
    /// Income for the month.
    pub income: KindTotals,
    /// Expenses for the month.
    pub expense: KindTotals,
    /// `income.total - expense.total`.
    pub balance: f64,
    /// The number of transactions in the month.
    pub total_count: u64,
    /// Totals per category, largest first.
    pub category_stats: Vec<CategoryStatistics>,
}

/// A summary of one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStatistics {
    /// The year.
    pub year: i32,
    /// Income for the year.
    pub income: KindTotals,
    /// Expenses for the year.
    pub expense: KindTotals,
    /// `income.total - expense.total`.
    pub balance: f64,
    /// The number of transactions in the year.
    pub total_count: u64,
    /// Exactly twelve entries, January first.
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Totals per category, largest first.
    pub category_stats: Vec<CategoryStatistics>,
}

/// Summarise `user_id`'s transactions recorded in `month` of `year` (UTC).
///
/// # Errors
/// Returns:
/// - [Error::InvalidArgument] if `year` is not in 1900..=2100 or `month` is
///   not in 1..=12,
/// - [Error::StoreUnavailable] if a query fails.
pub fn get_monthly_statistics(
    user_id: UserId,
    year: i32,
    month: i32,
    connection: &Connection,
) -> Result<MonthlyStatistics, Error> {
    let window = TimeWindow::month(year, month)?;

    let income = kind_totals(user_id, TransactionKind::Income, &window, connection)?;
    let expense = kind_totals(user_id, TransactionKind::Expense, &window, connection)?;
    let category_stats = category_breakdown(user_id, &window, connection)?;

    Ok(MonthlyStatistics {
        year,
        month: window.start.month().into(),
        income,
        expense,
        balance: income.total - expense.total,
        total_count: income.count + expense.count,
        category_stats,
    })
}

/// Summarise `user_id`'s transactions recorded in `year` (UTC), with a trend
/// entry for every month.
///
/// # Errors
/// Returns:
/// - [Error::InvalidArgument] if `year` is not in 1900..=2100,
/// - [Error::StoreUnavailable] if a query fails.
pub fn get_yearly_statistics(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<YearlyStatistics, Error> {
    let window = TimeWindow::year(year)?;

    let income = kind_totals(user_id, TransactionKind::Income, &window, connection)?;
    let expense = kind_totals(user_id, TransactionKind::Expense, &window, connection)?;
    let category_stats = category_breakdown(user_id, &window, connection)?;
    let monthly_trends = (1..=12)
        .map(|month| monthly_trend(user_id, year, month, connection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(YearlyStatistics {
        year,
        income,
        expense,
        balance: income.total - expense.total,
        total_count: income.count + expense.count,
        monthly_trends,
        category_stats,
    })
}
