//! Categories group transactions by what the money was earned or spent on.
//!
//! A fixed set of default categories is seeded when the database is created.
//! Defaults cannot be edited or deleted, user-created categories can be as
//! long as no transaction still refers to them.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::{create_category, create_category_endpoint};
pub use db::{create_category_table, seed_default_categories};
pub use delete::{delete_category, delete_category_endpoint};
pub use domain::{Category, CategoryInput, CategoryName};
pub use edit::{update_category, update_category_endpoint};
pub use list::{get_category, get_category_endpoint, list_categories, list_categories_endpoint};

pub(crate) use db::{CATEGORY_COLUMNS, map_category_row, select_category};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
