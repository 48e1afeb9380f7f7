//! Liveness and readiness endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, response};

/// The state needed for the health check.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// The database connection to probe.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a health check response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always "ok" when the service can answer.
    pub status: String,
    /// The crate version.
    pub version: String,
    /// "ok", or the reason the database could not be queried.
    pub database: String,
    /// Row counts per table, absent if the database could not be queried.
    pub database_info: Option<DatabaseInfo>,
}

/// Row counts for the ledger tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// The number of categories.
    pub categories: u64,
    /// The number of transactions across all users.
    pub transactions: u64,
}

/// Report on the service and its database.
///
/// A database problem is reported in the body, the status stays 200 OK.
pub async fn get_health(State(state): State<HealthState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (database, database_info) = match count_rows(&connection) {
        Ok(info) => ("ok".to_owned(), Some(info)),
        Err(error) => {
            tracing::error!("Health check could not query the database: {error}");
            (format!("error: {error}"), None)
        }
    };

    Ok(response::ok(HealthReport {
        status: "ok".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        database,
        database_info,
    }))
}

/// Reply with "pong".
pub async fn get_ping() -> Response {
    response::ok("pong")
}

fn count_rows(connection: &Connection) -> Result<DatabaseInfo, rusqlite::Error> {
    let categories = connection.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;
    let transactions =
        connection.query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))?;

    Ok(DatabaseInfo {
        categories,
        transactions,
    })
}
