//! Editing transactions.

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Response,
};
use rusqlite::{Connection, params};

use crate::{
    Error, TransactionId, UserId, response,
    timestamp::{SqlTimestamp, now_utc},
    transaction::{
        Transaction, TransactionInput, TransactionState,
        core::{select_transaction, validate_input},
        get_transaction,
    },
};

/// Overwrite the fields of one of `user_id`'s transactions.
///
/// The record time is kept when `input` does not set one.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction or the new category does not exist,
/// - [Error::PermissionDenied] if the transaction belongs to another user,
/// - [Error::InvalidArgument] if the amount is not positive or the kind does
///   not match the category,
/// - or [Error::StoreUnavailable] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserId,
    id: TransactionId,
    input: &TransactionInput,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(user_id, id, connection)?;
    validate_input(input, connection)?;

    let record_time = input.record_time.unwrap_or(existing.record_time);

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
        SET category_id = ?1, amount = ?2, kind = ?3, description = ?4, location = ?5,
            image_url = ?6, tags = ?7, record_time = ?8, updated_at = ?9
        WHERE id = ?10 AND user_id = ?11",
        params![
            input.category_id,
            input.amount,
            input.kind,
            input.description,
            input.location,
            input.image_url,
            input.tags,
            SqlTimestamp(record_time),
            SqlTimestamp(now_utc()),
            id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound("transaction"));
    }

    select_transaction(id, connection)?.ok_or(Error::NotFound("transaction"))
}

/// Handle a request to edit a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    path: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionInput>, JsonRejection>,
) -> Result<Response, Error> {
    let Path(transaction_id) = path?;
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = update_transaction(user_id, transaction_id, &input, &connection)?;

    Ok(response::ok(transaction))
}
