//! The kind of money movement shared by transactions and categories.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Whether money was earned or spent.
///
/// A transaction must always have the same kind as its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. a salary payment.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The string used for the kind in the database and in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidArgument(format!(
                "\"{other}\" is not a valid kind, expected \"income\" or \"expense\""
            ))),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, TransactionKind};

    #[test]
    fn parses_lowercase_names() {
        assert_eq!("income".parse(), Ok(TransactionKind::Income));
        assert_eq!("expense".parse(), Ok(TransactionKind::Expense));
    }

    #[test]
    fn rejects_unknown_names() {
        let result = "Income".parse::<TransactionKind>();

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&TransactionKind::Expense).unwrap();

        assert_eq!(json, "\"expense\"");
    }
}
