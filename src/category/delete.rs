//! Category deletion.

use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    CategoryId, Error,
    category::{
        CategoryState,
        db::{delete_category_row, select_category},
    },
    response,
    transaction::count_transactions_in_category,
};

/// Delete a user-defined category that no transaction refers to.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the category does not exist,
/// - [Error::PermissionDenied] if it is a default category,
/// - [Error::InvalidArgument] if transactions are still filed under it.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let category = select_category(category_id, connection)?.ok_or(Error::NotFound("category"))?;

    if category.is_default {
        return Err(Error::PermissionDenied(format!(
            "the default category \"{}\" cannot be deleted",
            category.name
        )));
    }

    let transaction_count = count_transactions_in_category(category_id, connection)?;
    if transaction_count > 0 {
        return Err(Error::InvalidArgument(format!(
            "cannot delete \"{}\" while {transaction_count} transactions are filed under it",
            category.name
        )));
    }

    if delete_category_row(category_id, connection)? == 0 {
        return Err(Error::NotFound("category"));
    }

    Ok(())
}

/// Handle a request to delete a category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<Response, Error> {
    let Path(category_id) = path?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, &connection)?;
    tracing::info!("Deleted category {category_id}");

    Ok(response::ok(()))
}

#[cfg(test)]
mod delete_category_tests {
    use time::macros::datetime;

    use crate::{
        Error, TransactionKind, UserId,
        category::{CategoryInput, create_category, delete_category, get_category, list_categories},
        test_utils::{get_test_connection, insert_test_transaction},
    };

    #[test]
    fn can_delete_unused_category() {
        let connection = get_test_connection();
        let input = CategoryInput::new("Pets", TransactionKind::Expense);
        let category = create_category(&input, &connection).unwrap();

        let result = delete_category(category.id, &connection);

        assert_eq!(result, Ok(()));
        assert_eq!(
            get_category(category.id, &connection),
            Err(Error::NotFound("category"))
        );
    }

    #[test]
    fn default_categories_cannot_be_deleted() {
        let connection = get_test_connection();
        let default = list_categories(None, &connection)
            .unwrap()
            .into_iter()
            .find(|category| category.is_default)
            .expect("defaults should be seeded");

        let result = delete_category(default.id, &connection);

        assert!(matches!(result, Err(Error::PermissionDenied(_))));
        assert_eq!(get_category(default.id, &connection), Ok(default));
    }

    #[test]
    fn referenced_category_cannot_be_deleted() {
        let connection = get_test_connection();
        let input = CategoryInput::new("Pets", TransactionKind::Expense);
        let category = create_category(&input, &connection).unwrap();
        insert_test_transaction(
            UserId::new(7),
            &category,
            30.0,
            datetime!(2024-02-02 12:00 UTC),
            &connection,
        );

        let result = delete_category(category.id, &connection);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(get_category(category.id, &connection).is_ok());
    }

    #[test]
    fn missing_category_is_not_found() {
        let connection = get_test_connection();

        let result = delete_category(999_999, &connection);

        assert_eq!(result, Err(Error::NotFound("category")));
    }
}
