//! Category editing.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Response,
};
use rusqlite::Connection;

use crate::{
    CategoryId, Error,
    category::{
        Category, CategoryInput, CategoryName, CategoryState,
        db::{CategoryRow, select_category, select_category_by_name, update_category_row},
    },
    response,
    timestamp::now_utc,
    transaction::count_transactions_in_category,
};

/// Overwrite the name, kind, icon and colour of a user-defined category.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the category does not exist,
/// - [Error::PermissionDenied] if it is a default category,
/// - [Error::InvalidArgument] if the new name is blank, or the kind changes
///   while transactions are filed under the category,
/// - [Error::AlreadyExists] if another category already has the new name.
pub fn update_category(
    category_id: CategoryId,
    input: &CategoryInput,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = select_category(category_id, connection)?.ok_or(Error::NotFound("category"))?;

    if existing.is_default {
        return Err(Error::PermissionDenied(format!(
            "the default category \"{}\" cannot be modified",
            existing.name
        )));
    }

    let name = CategoryName::new(&input.name)?;

    if let Some(other) = select_category_by_name(&name, connection)?
        && other.id != category_id
    {
        return Err(Error::AlreadyExists(name.to_string()));
    }

    if input.kind != existing.kind && count_transactions_in_category(category_id, connection)? > 0
    {
        return Err(Error::InvalidArgument(format!(
            "cannot change the kind of \"{}\" while transactions are filed under it",
            existing.name
        )));
    }

    let now = now_utc();
    let row = CategoryRow {
        name: &name,
        kind: input.kind,
        icon: &input.icon,
        color: &input.color,
    };

    if update_category_row(category_id, &row, now, connection)? == 0 {
        return Err(Error::NotFound("category"));
    }

    Ok(Category {
        name,
        kind: input.kind,
        icon: input.icon.clone(),
        color: input.color.clone(),
        updated_at: now,
        ..existing
    })
}

/// Handle a request to edit a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    path: Result<Path<CategoryId>, PathRejection>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Response, Error> {
    let Path(category_id) = path?;
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = update_category(category_id, &input, &connection)?;

    Ok(response::ok(category))
}
