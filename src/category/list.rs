//! Reading categories.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    CategoryId, Error, TransactionKind,
    category::{
        Category, CategoryState,
        db::{select_categories, select_category},
    },
    response,
};

/// Get all categories ordered by kind then ID, or only the categories of `kind`.
pub fn list_categories(
    kind: Option<TransactionKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    select_categories(kind, connection)
}

/// Get a single category.
///
/// # Errors
/// Returns [Error::NotFound] if there is no category with `category_id`.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    select_category(category_id, connection)?.ok_or(Error::NotFound("category"))
}

/// The query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    /// Only list categories of this kind.
    #[serde(default, alias = "type")]
    pub kind: Option<TransactionKind>,
}

/// List the categories as JSON.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    query: Result<Query<CategoryListQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = list_categories(query.kind, &connection)?;

    Ok(response::ok(categories))
}

/// Get a single category as JSON.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<Response, Error> {
    let Path(category_id) = path?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, &connection)?;

    Ok(response::ok(category))
}
