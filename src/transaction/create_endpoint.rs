//! Recording new transactions.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};
use rusqlite::{Connection, params};

use crate::{
    Error, UserId, endpoints, response,
    timestamp::{SqlTimestamp, now_utc},
    transaction::{
        Transaction, TransactionInput, TransactionState,
        core::{select_transaction, validate_input},
    },
};

/// Record a transaction for `user_id`.
///
/// The record time defaults to now. Nothing is stored if validation fails.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the amount is not positive or the kind does
///   not match the category,
/// - [Error::NotFound] if the category does not exist,
/// - or [Error::StoreUnavailable] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    input: &TransactionInput,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_input(input, connection)?;

    let now = now_utc();
    let record_time = input.record_time.unwrap_or(now);

    connection.execute(
        "INSERT INTO \"transaction\" (
            user_id, category_id, amount, kind, description, location, image_url, tags,
            record_time, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            user_id.as_i64(),
            input.category_id,
            input.amount,
            input.kind,
            input.description,
            input.location,
            input.image_url,
            input.tags,
            SqlTimestamp(record_time),
            SqlTimestamp(now),
        ],
    )?;

    let id = connection.last_insert_rowid();

    select_transaction(id, connection)?.ok_or(Error::NotFound("transaction"))
}

/// Handle a request to record a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    payload: Result<Json<TransactionInput>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, &input, &connection)?;
    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    let location = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);

    Ok(response::created_at(&location, transaction))
}
