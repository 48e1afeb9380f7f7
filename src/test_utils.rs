//! Helpers shared by the unit tests.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Category, UserId,
    category::list_categories,
    db::initialize,
    pagination::PaginationConfig,
    transaction::{Transaction, TransactionInput, TransactionState, create_transaction},
};

/// An initialised in-memory database with the default categories.
pub fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// [get_test_connection] wrapped for use in endpoint state.
pub fn get_test_connection_arc() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(get_test_connection()))
}

/// State for the transaction endpoints with the default pagination config.
pub fn get_test_transaction_state() -> TransactionState {
    TransactionState {
        db_connection: get_test_connection_arc(),
        pagination_config: PaginationConfig::default(),
    }
}

/// Look up a seeded category by name, panicking if it does not exist.
#[track_caller]
pub fn get_category_by_name(name: &str, connection: &Connection) -> Category {
    list_categories(None, connection)
        .expect("Could not list categories")
        .into_iter()
        .find(|category| category.name.as_ref() == name)
        .unwrap_or_else(|| panic!("no category named {name}"))
}

/// Record a transaction of the category's kind.
#[track_caller]
pub fn insert_test_transaction(
    user_id: UserId,
    category: &Category,
    amount: f64,
    record_time: OffsetDateTime,
    connection: &Connection,
) -> Transaction {
    let input = TransactionInput::new(category.id, amount, category.kind).record_time(record_time);

    create_transaction(user_id, &input, connection).expect("Could not create test transaction")
}

/// Count the transactions of every user.
pub fn count_all_transactions(connection: &Connection) -> u64 {
    connection
        .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
        .expect("Could not count transactions")
}

