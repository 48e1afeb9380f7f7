//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The [Transaction] model and the [TransactionInput] used to create and edit one
//! - The lifecycle operations that enforce ownership and category rules
//! - The filtered, paginated transaction listing
//! - The JSON endpoints for all of the above

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod query;

pub use core::{
    Transaction, TransactionInput, create_transaction_table, get_transaction,
    get_transaction_endpoint,
};
pub use create_endpoint::{create_transaction, create_transaction_endpoint};
pub use delete_endpoint::{delete_transaction, delete_transaction_endpoint};
pub use edit_endpoint::{update_transaction, update_transaction_endpoint};
pub use query::{TransactionFilter, TransactionPage, list_transactions, list_transactions_endpoint};

pub(crate) use core::count_transactions_in_category;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, pagination::PaginationConfig};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how transactions are paged.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}
