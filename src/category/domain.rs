//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CategoryId, Error, TransactionKind};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// The name is kept exactly as given, so names that differ only in case or
    /// surrounding whitespace are distinct.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidArgument] if `name` is empty
    /// or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            Err(Error::InvalidArgument(
                "category name must not be empty".to_owned(),
            ))
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty, e.g. because it
    /// was read back from the database.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryName::new(&value)
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category that transactions of the same kind are filed under, e.g. "Food".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: CategoryName,
    /// Transactions filed under this category must have the same kind.
    pub kind: TransactionKind,
    /// An icon slug for clients to display.
    pub icon: String,
    /// A display colour, e.g. "#4CAF50".
    pub color: String,
    /// Whether this is one of the built-in categories.
    ///
    /// Built-in categories cannot be edited or deleted.
    pub is_default: bool,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields a user supplies to create or edit a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    /// The name, must not be blank.
    pub name: String,
    /// Whether the category is for income or expenses.
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    /// An icon slug, may be empty.
    #[serde(default)]
    pub icon: String,
    /// A display colour, may be empty.
    #[serde(default)]
    pub color: String,
}

impl CategoryInput {
    /// Convenience constructor with an empty icon and colour.
    pub fn new(name: &str, kind: TransactionKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            icon: String::new(),
            color: String::new(),
        }
    }
}


#[cfg(test)]
mod category_input_tests {
    use crate::{TransactionKind, category::CategoryInput};

    #[test]
    fn accepts_type_as_alias_for_kind() {
        let input: CategoryInput =
            serde_json::from_str(r#"{"name": "Pets", "type": "expense", "icon": "paw"}"#).unwrap();

        assert_eq!(input.kind, TransactionKind::Expense);
        assert_eq!(input.icon, "paw");
        assert_eq!(input.color, "");
    }
}
