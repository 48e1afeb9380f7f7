//! Category creation.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    Error,
    category::{
        Category, CategoryInput, CategoryName, CategoryState,
        db::{CategoryRow, insert_category, select_category_by_name},
    },
    endpoints, response,
    timestamp::now_utc,
};

/// Create a user-defined category.
///
/// # Errors
/// Returns:
/// - [Error::InvalidArgument] if the name is blank,
/// - [Error::AlreadyExists] if a category with exactly the same name exists.
pub fn create_category(input: &CategoryInput, connection: &Connection) -> Result<Category, Error> {
    let name = CategoryName::new(&input.name)?;

    if select_category_by_name(&name, connection)?.is_some() {
        return Err(Error::AlreadyExists(name.to_string()));
    }

    let row = CategoryRow {
        name: &name,
        kind: input.kind,
        icon: &input.icon,
        color: &input.color,
    };

    insert_category(&row, false, now_utc(), connection)
}

/// Handle a request to create a category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(&input, &connection)?;
    tracing::info!("Created category {} ({})", category.name, category.id);

    let location = endpoints::format_endpoint(endpoints::CATEGORY, category.id);

    Ok(response::created_at(&location, category))
}
