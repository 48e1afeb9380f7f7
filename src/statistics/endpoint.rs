//! JSON endpoints for the statistics.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserId, response,
    statistics::{get_monthly_statistics, get_yearly_statistics},
};

/// The state needed by the statistics endpoints.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the monthly statistics.
#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    /// The year, 1900 to 2100.
    pub year: i32,
    /// The month, 1 to 12.
    pub month: i32,
}

/// The query parameters for the yearly statistics.
#[derive(Debug, Deserialize)]
pub struct YearlyQuery {
    /// The year, 1900 to 2100.
    pub year: i32,
}

/// Get the user's statistics for a month.
pub async fn monthly_statistics_endpoint(
    State(state): State<StatisticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(MonthlyQuery { year, month }) = query?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statistics = get_monthly_statistics(user_id, year, month, &connection)?;

    Ok(response::ok(statistics))
}

/// Get the user's statistics for a year.
pub async fn yearly_statistics_endpoint(
    State(state): State<StatisticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<YearlyQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(YearlyQuery { year }) = query?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statistics = get_yearly_statistics(user_id, year, &connection)?;

    Ok(response::ok(statistics))
}
