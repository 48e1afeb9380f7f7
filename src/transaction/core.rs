//! Defines the core data models and database queries for transactions.

use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    response::Response,
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, TransactionId, TransactionKind, UserId,
    category::{CATEGORY_COLUMNS, Category, map_category_row, select_category},
    response,
    timestamp::SqlTimestamp,
    transaction::TransactionState,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction. Only they may see or change it.
    pub user_id: UserId,
    /// The ID of the category the transaction is filed under.
    pub category_id: CategoryId,
    /// The category the transaction is filed under.
    pub category: Category,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether money was earned or spent. Always the same as the category's kind.
    pub kind: TransactionKind,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Where the transaction happened.
    pub location: String,
    /// A link to a photo of the receipt.
    pub image_url: String,
    /// Free-form tags.
    pub tags: String,
    /// When the money was earned or spent.
    #[serde(with = "time::serde::rfc3339")]
    pub record_time: OffsetDateTime,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last edited.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields a user supplies to create or edit a transaction.
///
/// Build one with [TransactionInput::new] and the setter methods, or
/// deserialize it from a request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// The category to file the transaction under.
    pub category_id: CategoryId,
    /// The amount of money, must be positive.
    pub amount: f64,
    /// Must match the kind of the category.
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Optional location.
    #[serde(default)]
    pub location: String,
    /// Optional receipt link.
    #[serde(default)]
    pub image_url: String,
    /// Optional tags.
    #[serde(default)]
    pub tags: String,
    /// When the money was earned or spent.
    ///
    /// Defaults to the current time on creation, and to the existing value on edit.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub record_time: Option<OffsetDateTime>,
}

impl TransactionInput {
    /// Create an input with the required fields and empty optional fields.
    pub fn new(category_id: CategoryId, amount: f64, kind: TransactionKind) -> Self {
        Self {
            category_id,
            amount,
            kind,
            description: String::new(),
            location: String::new(),
            image_url: String::new(),
            tags: String::new(),
            record_time: None,
        }
    }

    /// Set when the transaction happened.
    pub fn record_time(mut self, record_time: OffsetDateTime) -> Self {
        self.record_time = Some(record_time);
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "\"transaction\".id, \"transaction\".user_id, \
    \"transaction\".category_id, \"transaction\".amount, \"transaction\".kind, \
    \"transaction\".description, \"transaction\".location, \"transaction\".image_url, \
    \"transaction\".tags, \"transaction\".record_time, \"transaction\".created_at, \
    \"transaction\".updated_at";

/// The number of columns in `TRANSACTION_COLUMNS`, i.e. the offset of the category columns.
const TRANSACTION_COLUMN_COUNT: usize = 12;

/// Build a query that selects transactions joined with their category.
///
/// `tail` is appended after the join, e.g. a `WHERE` clause. Map the rows
/// with [map_transaction_row].
pub(crate) fn select_transactions_sql(tail: &str) -> String {
    format!(
        "SELECT {TRANSACTION_COLUMNS}, {CATEGORY_COLUMNS} FROM \"transaction\" \
        INNER JOIN category ON category.id = \"transaction\".category_id {tail}"
    )
}

/// Create the transaction table in the database.
///
/// The category table must exist first.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '',
            record_time TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_record_time
            ON \"transaction\"(user_id, record_time);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Check the amount, category and kind of `input`.
///
/// Returns the category the transaction will be filed under.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the amount is not a positive number or the
///   kind does not match the category,
/// - [Error::NotFound] if the category does not exist.
pub(crate) fn validate_input(
    input: &TransactionInput,
    connection: &Connection,
) -> Result<Category, Error> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "amount must be greater than zero, got {}",
            input.amount
        )));
    }

    let category =
        select_category(input.category_id, connection)?.ok_or(Error::NotFound("category"))?;

    if category.kind != input.kind {
        return Err(Error::InvalidArgument(format!(
            "a {} transaction cannot be filed under the {} category \"{}\"",
            input.kind, category.kind, category.name
        )));
    }

    Ok(category)
}

/// Retrieve a transaction by `id` regardless of its owner.
pub(crate) fn select_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    let transaction = connection
        .prepare(&select_transactions_sql("WHERE \"transaction\".id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .optional()?;

    Ok(transaction)
}

/// Retrieve one of `user_id`'s transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - [Error::PermissionDenied] if the transaction belongs to another user,
/// - or [Error::StoreUnavailable] if there is some other SQL error.
pub fn get_transaction(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = select_transaction(id, connection)?.ok_or(Error::NotFound("transaction"))?;

    if transaction.user_id != user_id {
        tracing::warn!("User {user_id} tried to access transaction {id} owned by another user");
        return Err(Error::PermissionDenied(
            "the transaction belongs to another user".to_owned(),
        ));
    }

    Ok(transaction)
}

/// Count the transactions of any user filed under `category_id`.
pub(crate) fn count_transactions_in_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Map a row selected with [select_transactions_sql] to a Transaction.
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let category_id = row.get(2)?;
    let amount = row.get(3)?;
    let kind = row.get(4)?;
    let description = row.get(5)?;
    let location = row.get(6)?;
    let image_url = row.get(7)?;
    let tags = row.get(8)?;
    let SqlTimestamp(record_time) = row.get(9)?;
    let SqlTimestamp(created_at) = row.get(10)?;
    let SqlTimestamp(updated_at) = row.get(11)?;
    let category = map_category_row(row, TRANSACTION_COLUMN_COUNT)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        category,
        amount,
        kind,
        description,
        location,
        image_url,
        tags,
        record_time,
        created_at,
        updated_at,
    })
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// Get one of the user's transactions as JSON.
pub async fn get_transaction_endpoint(
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

    let transaction = get_transaction(user_id, transaction_id, &connection)?;

    Ok(response::ok(transaction))
}

// ============================================================================
// TESTS
// ============================================================================
