//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, TransactionKind,
    category::{Category, CategoryName},
    timestamp::{SqlTimestamp, now_utc},
};

/// The category columns in the order expected by [map_category_row].
///
/// The columns are qualified with the table name so the list can be used in
/// joins.
pub(crate) const CATEGORY_COLUMNS: &str = "category.id, category.name, category.kind, \
    category.icon, category.color, category.is_default, category.created_at, category.updated_at";

/// The built-in categories as (name, kind, icon, colour).
const DEFAULT_CATEGORIES: [(&str, TransactionKind, &str, &str); 14] = [
    ("Salary", TransactionKind::Income, "salary", "#4CAF50"),
    ("Bonus", TransactionKind::Income, "bonus", "#8BC34A"),
    ("Investment", TransactionKind::Income, "investment", "#CDDC39"),
    ("Reimbursement", TransactionKind::Income, "reimburse", "#FFC107"),
    ("Other Income", TransactionKind::Income, "other_income", "#FF9800"),
    ("Food", TransactionKind::Expense, "food", "#F44336"),
    ("Transport", TransactionKind::Expense, "transport", "#E91E63"),
    ("Shopping", TransactionKind::Expense, "shopping", "#9C27B0"),
    ("Entertainment", TransactionKind::Expense, "entertainment", "#673AB7"),
    ("Home", TransactionKind::Expense, "home", "#3F51B5"),
    ("Communication", TransactionKind::Expense, "communication", "#2196F3"),
    ("Medical", TransactionKind::Expense, "medical", "#00BCD4"),
    ("Education", TransactionKind::Expense, "education", "#009688"),
    ("Other Expense", TransactionKind::Expense, "other_expense", "#FF5722"),
];

/// The fields written when a category row is inserted or updated.
pub(super) struct CategoryRow<'a> {
    pub name: &'a CategoryName,
    pub kind: TransactionKind,
    pub icon: &'a str,
    pub color: &'a str,
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            icon TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT '',
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_kind ON category(kind);",
    )?;

    Ok(())
}

/// Insert the built-in categories unless they have been inserted before.
///
/// Returns the number of categories inserted, zero if the defaults already exist.
pub fn seed_default_categories(connection: &Connection) -> Result<usize, Error> {
    let already_seeded: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM category WHERE is_default = 1)",
        [],
        |row| row.get(0),
    )?;

    if already_seeded {
        tracing::debug!("Default categories already exist, skipping seeding");
        return Ok(0);
    }

    let now = now_utc();

    for (name, kind, icon, color) in DEFAULT_CATEGORIES {
        let name = CategoryName::new_unchecked(name);
        let row = CategoryRow {
            name: &name,
            kind,
            icon,
            color,
        };

        insert_category(&row, true, now, connection)?;
    }

    tracing::info!("Seeded {} default categories", DEFAULT_CATEGORIES.len());

    Ok(DEFAULT_CATEGORIES.len())
}

/// Insert a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::AlreadyExists] if a category with the same name exists.
pub(super) fn insert_category(
    row: &CategoryRow,
    is_default: bool,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (name, kind, icon, color, is_default, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                row.name.as_ref(),
                row.kind,
                row.icon,
                row.color,
                is_default,
                SqlTimestamp(now)
            ],
        )
        .map_err(|error| map_unique_name_error(error, row.name))?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: row.name.clone(),
        kind: row.kind,
        icon: row.icon.to_owned(),
        color: row.color.to_owned(),
        is_default,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a single category by ID.
pub(crate) fn select_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    let category = connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id"
        ))?
        .query_row(&[(":id", &category_id)], |row| map_category_row(row, 0))
        .optional()?;

    Ok(category)
}

/// Retrieve a single category by its exact name.
pub(super) fn select_category_by_name(
    name: &CategoryName,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    let category = connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE name = :name"
        ))?
        .query_row(&[(":name", name.as_ref())], |row| map_category_row(row, 0))
        .optional()?;

    Ok(category)
}

/// Retrieve all categories, or only those of `kind`, ordered by kind then ID.
pub(super) fn select_categories(
    kind: Option<TransactionKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM category
        WHERE (?1 IS NULL OR kind = ?1)
        ORDER BY kind ASC, id ASC"
    ))?;

    statement
        .query_map([kind], |row| map_category_row(row, 0))?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the user editable fields of a category.
///
/// Returns the number of rows changed.
pub(super) fn update_category_row(
    category_id: CategoryId,
    row: &CategoryRow,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category
            SET name = ?1, kind = ?2, icon = ?3, color = ?4, updated_at = ?5
            WHERE id = ?6",
            params![
                row.name.as_ref(),
                row.kind,
                row.icon,
                row.color,
                SqlTimestamp(now),
                category_id
            ],
        )
        .map_err(|error| map_unique_name_error(error, row.name))?;

    Ok(rows_affected)
}

/// Delete a category by ID, returning the number of rows deleted.
pub(super) fn delete_category_row(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<usize, Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    Ok(rows_affected)
}

/// Map a row to a [Category], reading [CATEGORY_COLUMNS] starting at column `offset`.
pub(crate) fn map_category_row(row: &Row, offset: usize) -> Result<Category, rusqlite::Error> {
    let id = row.get(offset)?;
    let raw_name: String = row.get(offset + 1)?;
    let kind = row.get(offset + 2)?;
    let icon = row.get(offset + 3)?;
    let color = row.get(offset + 4)?;
    let is_default = row.get(offset + 5)?;
    let SqlTimestamp(created_at) = row.get(offset + 6)?;
    let SqlTimestamp(updated_at) = row.get(offset + 7)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
        icon,
        color,
        is_default,
        created_at,
        updated_at,
    })
}

fn map_unique_name_error(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::AlreadyExists(name.to_string()),
        error => error.into(),
    }
}
