//! Record Ledger is a personal finance ledger service.
//!
//! Users record income and expense transactions against categories and query
//! aggregated statistics: monthly and yearly totals, per-category breakdowns and
//! monthly trends.
//!
//! The library exposes the ledger operations as plain functions over a SQLite
//! [rusqlite::Connection], a sliding-window [RateLimiter] for admission control,
//! and a JSON REST API built on axum that wires the two together.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod category;
mod cors;
mod database_id;
mod db;
mod endpoints;
mod health;
mod kind;
mod logging;
mod pagination;
mod rate_limit;
mod response;
mod routing;
mod statistics;
mod timestamp;
mod transaction;
mod user;
mod window;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{
    Category, CategoryInput, CategoryName, create_category, delete_category, get_category,
    list_categories, update_category,
};
pub use cors::CorsConfig;
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use kind::TransactionKind;
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use response::ApiResponse;
pub use routing::build_router;
pub use statistics::{
    CategoryStatistics, KindTotals, MonthlyStatistics, MonthlyTrend, YearlyStatistics,
    get_monthly_statistics, get_yearly_statistics,
};
pub use transaction::{
    Transaction, TransactionFilter, TransactionInput, TransactionPage, create_transaction,
    delete_transaction, get_transaction, list_transactions, update_transaction,
};
pub use user::{USER_ID_HEADER, UserId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A value supplied by the caller was rejected, e.g. a year outside of
    /// 1900..=2100, a non-positive amount or a transaction whose kind does not
    /// match its category.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested resource was not found.
    ///
    /// The string names the kind of resource, e.g. "transaction".
    #[error("the requested {0} could not be found")]
    NotFound(&'static str),

    /// The caller is not allowed to perform the operation, e.g. editing another
    /// user's transaction or modifying a default category.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A category with the same name already exists.
    #[error("the category \"{0}\" already exists")]
    AlreadyExists(String),

    /// The request body is larger than [REQUEST_BODY_LIMIT] bytes.
    #[error("the request body is larger than {} bytes", REQUEST_BODY_LIMIT)]
    PayloadTooLarge,

    /// The client has sent too many requests in the current window.
    #[error("too many requests, try again later")]
    RateLimited,

    /// The request did not carry a valid user ID.
    #[error("the request is not authenticated")]
    Unauthenticated,

    /// An unhandled/unexpected SQL error.
    ///
    /// The original error is kept so the cause can be logged on the server.
    /// When communicating with the client this error is replaced with a
    /// general message.
    #[error("the ledger store failed: {0}")]
    StoreUnavailable(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::StoreUnavailable(value)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code that best describes the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::StoreUnavailable(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            // Store errors are not intended to be shown to the client.
            Error::StoreUnavailable(error) => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            Error::DatabaseLockError => {
                "An unexpected error occurred, try again later.".to_owned()
            }
            error => error.to_string(),
        };

        ApiResponse::<()>::error(status, message).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (Error::InvalidArgument("x".to_owned()), StatusCode::BAD_REQUEST),
            (Error::NotFound("category"), StatusCode::NOT_FOUND),
            (Error::PermissionDenied("x".to_owned()), StatusCode::FORBIDDEN),
            (Error::AlreadyExists("Food".to_owned()), StatusCode::CONFLICT),
            (Error::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (Error::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            assert_eq!(error.status_code(), want, "wrong status for {error:?}");
        }
    }

    #[test]
    fn store_errors_are_wrapped_with_their_cause() {
        let error = Error::from(rusqlite::Error::InvalidQuery);

        assert_eq!(error, Error::StoreUnavailable(rusqlite::Error::InvalidQuery));
        assert!(error.to_string().starts_with("the ledger store failed"));
    }

    #[test]
    fn store_error_response_hides_cause() {
        let response = Error::StoreUnavailable(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
