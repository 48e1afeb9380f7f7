//! Deleting transactions.

use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    Error, TransactionId, UserId, response,
    transaction::{TransactionState, get_transaction},
};

/// Permanently delete one of `user_id`'s transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction does not exist,
/// - [Error::PermissionDenied] if the transaction belongs to another user,
/// - or [Error::StoreUnavailable] if there is some other SQL error.
pub fn delete_transaction(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    get_transaction(user_id, id, connection)?;

    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound("transaction"));
    }

    Ok(())
}

/// Handle a request to delete a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Response, Error> {
    let Path(transaction_id) = path?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(user_id, transaction_id, &connection)?;
    tracing::debug!("User {user_id} deleted transaction {transaction_id}");

    Ok(response::ok(()))
}

#[cfg(test)]
mod delete_transaction_tests {
    use time::macros::datetime;

    use crate::{
        Error, UserId,
        test_utils::{
            count_all_transactions, get_category_by_name, get_test_connection,
            insert_test_transaction,
        },
        transaction::{delete_transaction, get_transaction},
    };

    #[test]
    fn delete_is_terminal() {
        let connection = get_test_connection();
        let food = get_category_by_name("Food", &connection);
        let transaction = insert_test_transaction(
            UserId::new(1),
            &food,
            5.0,
            datetime!(2024-01-01 00:00 UTC),
            &connection,
        );

        assert_eq!(delete_transaction(UserId::new(1), transaction.id, &connection), Ok(()));

        assert_eq!(
            get_transaction(UserId::new(1), transaction.id, &connection),
            Err(Error::NotFound("transaction"))
        );
        assert_eq!(
            delete_transaction(UserId::new(1), transaction.id, &connection),
            Err(Error::NotFound("transaction"))
        );
    }

    #[test]
    fn cannot_delete_other_users_transaction() {
        let connection = get_test_connection();
        let food = get_category_by_name("Food", &connection);
        let transaction = insert_test_transaction(
            UserId::new(1),
            &food,
            5.0,
            datetime!(2024-01-01 00:00 UTC),
            &connection,
        );

        let result = delete_transaction(UserId::new(2), transaction.id, &connection);

        assert!(matches!(result, Err(Error::PermissionDenied(_))));
        assert_eq!(count_all_transactions(&connection), 1);
    }
}
