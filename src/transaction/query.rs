//! Filtered, paginated listing of a user's transactions.

use axum::{
    Extension,
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use rusqlite::{Connection, ToSql, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::{
    CategoryId, Error, TransactionKind, UserId,
    pagination::{PageInfo, Pagination, PaginationConfig},
    response,
    timestamp::SqlTimestamp,
    transaction::{
        Transaction, TransactionState,
        core::{map_transaction_row, select_transactions_sql},
    },
    window::{parse_date, start_of_day, start_of_next_day},
};

/// Criteria for listing transactions. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only include transactions of this kind.
    #[serde(default, alias = "type")]
    pub kind: Option<TransactionKind>,
    /// Only include transactions filed under this category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Only include transactions on or after this `YYYY-MM-DD` date.
    ///
    /// Ignored if it is not a valid date.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Only include transactions on or before this `YYYY-MM-DD` date, inclusive
    /// of the whole day.
    ///
    /// Ignored if it is not a valid date.
    #[serde(default)]
    pub end_date: Option<String>,
    /// The 1-based page number.
    #[serde(default)]
    pub page: Option<i64>,
    /// The number of transactions per page.
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// One page of transactions and how it relates to the full result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    /// The transactions on this page, newest first.
    pub transactions: Vec<Transaction>,
    /// The page number, size and totals.
    pub pagination: PageInfo,
}

/// The `WHERE` clause and its parameters for a [TransactionFilter].
struct Predicate {
    clauses: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl Predicate {
    fn new(user_id: UserId, filter: &TransactionFilter) -> Self {
        let mut predicate = Self {
            clauses: vec!["\"transaction\".user_id = ?"],
            params: vec![Box::new(user_id.as_i64())],
        };

        if let Some(kind) = filter.kind {
            predicate.push("\"transaction\".kind = ?", Box::new(kind));
        }

        if let Some(category_id) = filter.category_id {
            predicate.push("\"transaction\".category_id = ?", Box::new(category_id));
        }

        if let Some(start) = filter.start_date.as_deref().and_then(parse_date) {
            predicate.push(
                "\"transaction\".record_time >= ?",
                Box::new(SqlTimestamp(start_of_day(start))),
            );
        }

        if let Some(end) = filter
            .end_date
            .as_deref()
            .and_then(parse_date)
            .and_then(start_of_next_day)
        {
            predicate.push("\"transaction\".record_time < ?", Box::new(SqlTimestamp(end)));
        }

        predicate
    }

    fn push(&mut self, clause: &'static str, param: Box<dyn ToSql>) {
        self.clauses.push(clause);
        self.params.push(param);
    }

    fn where_clause(&self) -> String {
        format!("WHERE {}", self.clauses.join(" AND "))
    }
}

/// List `user_id`'s transactions that match `filter`, one page at a time.
///
/// Transactions are ordered newest first by record time, then by creation
/// time and ID so that the order is stable. The page and page size are
/// clamped to `pagination_config` rather than rejected. A malformed date in
/// the filter is ignored.
///
/// # Errors
/// Returns [Error::StoreUnavailable] if the database query fails.
pub fn list_transactions(
    user_id: UserId,
    filter: &TransactionFilter,
    pagination_config: &PaginationConfig,
    connection: &Connection,
) -> Result<TransactionPage, Error> {
    let pagination = Pagination::clamp(filter.page, filter.page_size, pagination_config);
    let predicate = Predicate::new(user_id, filter);
    let where_clause = predicate.where_clause();

    let total: u64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM \"transaction\" {where_clause}"),
        params_from_iter(predicate.params.iter()),
        |row| row.get(0),
    )?;

    let limit = i64::try_from(pagination.page_size).unwrap_or(i64::MAX);
    let offset = i64::try_from(pagination.offset()).unwrap_or(i64::MAX);
    let query = select_transactions_sql(&format!(
        "{where_clause} \
        ORDER BY \"transaction\".record_time DESC, \"transaction\".created_at DESC, \"transaction\".id DESC \
        LIMIT ? OFFSET ?"
    ));
    let params = predicate
        .params
        .iter()
        .map(|param| param.as_ref())
        .chain([&limit as &dyn ToSql, &offset as &dyn ToSql]);

    let transactions = connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransactionPage {
        transactions,
        pagination: pagination.info(total),
    })
}

/// List the user's transactions as JSON.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<TransactionFilter>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(filter) = query?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = list_transactions(user_id, &filter, &state.pagination_config, &connection)?;

    Ok(response::ok(page))
}

#[cfg(test)]
mod list_transactions_tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        Category, TransactionKind, UserId,
        pagination::PaginationConfig,
        test_utils::{get_category_by_name, get_test_connection, insert_test_transaction},
        transaction::{Transaction, TransactionFilter},
    };

    use super::list_transactions;

    struct Fixture {
        connection: Connection,
        food: Category,
        transport: Category,
        salary: Category,
    }

    fn get_fixture() -> Fixture {
        let connection = get_test_connection();
        let food = get_category_by_name("Food", &connection);
        let transport = get_category_by_name("Transport", &connection);
        let salary = get_category_by_name("Salary", &connection);

        Fixture {
            connection,
            food,
            transport,
            salary,
        }
    }

    /// Insert 30 transactions for user 1 and 5 for user 2 spread over January and February 2024.
    fn insert_mixed_transactions(fixture: &Fixture) {
        let start = datetime!(2024-01-01 06:00 UTC);

        for i in 0..30 {
            let category = match i % 3 {
                0 => &fixture.food,
                1 => &fixture.transport,
                _ => &fixture.salary,
            };
            insert_test_transaction(
                UserId::new(1),
                category,
                (i + 1) as f64,
                start + Duration::days(i * 2),
                &fixture.connection,
            );
        }

        for i in 0..5 {
            insert_test_transaction(
                UserId::new(2),
                &fixture.food,
                100.0,
                start + Duration::days(i),
                &fixture.connection,
            );
        }
    }

    fn list_all(filter: &TransactionFilter, fixture: &Fixture) -> Vec<Transaction> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let filter = TransactionFilter {
                page: Some(page),
                page_size: Some(7),
                ..filter.clone()
            };
            let got = list_transactions(
                UserId::new(1),
                &filter,
                &PaginationConfig::default(),
                &fixture.connection,
            )
            .expect("Could not list transactions");
            let done = got.transactions.is_empty();
            all.extend(got.transactions);

            if done {
                return all;
            }
            page += 1;
        }
    }

    #[test]
    fn empty_ledger_returns_empty_page() {
        let fixture = get_fixture();

        let got = list_transactions(
            UserId::new(1),
            &TransactionFilter::default(),
            &PaginationConfig::default(),
            &fixture.connection,
        )
        .unwrap();

        assert!(got.transactions.is_empty());
        assert_eq!(got.pagination.total, 0);
        assert_eq!(got.pagination.total_pages, 0);
    }

    #[test]
    fn page_size_is_bounded() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);

        for (requested, want_len) in [(Some(1000), 30), (Some(0), 20), (None, 20), (Some(5), 5)] {
            let filter = TransactionFilter {
                page_size: requested,
                ..Default::default()
            };
            let config = PaginationConfig {
                max_page_size: 100,
                ..Default::default()
            };

            let got = list_transactions(UserId::new(1), &filter, &config, &fixture.connection)
                .unwrap();

            assert_eq!(
                got.transactions.len(),
                want_len,
                "requested page size {requested:?}"
            );
            assert!(got.transactions.len() as u64 <= got.pagination.page_size);
            assert!(got.pagination.page_size <= 100);
        }
    }

    #[test]
    fn only_lists_own_transactions() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);

        let all = list_all(&TransactionFilter::default(), &fixture);

        assert_eq!(all.len(), 30);
        assert!(all.iter().all(|transaction| transaction.user_id == UserId::new(1)));
    }

    #[test]
    fn results_satisfy_filter_predicates() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            category_id: Some(fixture.food.id),
            start_date: Some("2024-01-10".to_owned()),
            end_date: Some("2024-02-10".to_owned()),
            ..Default::default()
        };

        let got = list_all(&filter, &fixture);

        assert!(!got.is_empty());
        for transaction in &got {
            assert_eq!(transaction.kind, TransactionKind::Expense);
            assert_eq!(transaction.category_id, fixture.food.id);
            assert!(transaction.record_time >= datetime!(2024-01-10 00:00 UTC));
            assert!(transaction.record_time < datetime!(2024-02-11 00:00 UTC));
        }
    }

    #[test]
    fn total_equals_unpaginated_sweep() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Income),
            ..Default::default()
        };

        let swept = list_all(&filter, &fixture);
        let first_page = list_transactions(
            UserId::new(1),
            &TransactionFilter {
                page_size: Some(3),
                ..filter.clone()
            },
            &PaginationConfig::default(),
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(swept.len(), 10);
        assert_eq!(first_page.pagination.total, 10);
        assert_eq!(first_page.pagination.total_pages, 4);
    }

    #[test]
    fn orders_newest_first_with_stable_ties() {
        let fixture = get_fixture();
        let same_time = datetime!(2024-03-01 12:00 UTC);
        let first = insert_test_transaction(
            UserId::new(1),
            &fixture.food,
            1.0,
            same_time,
            &fixture.connection,
        );
        let second = insert_test_transaction(
            UserId::new(1),
            &fixture.food,
            2.0,
            same_time,
            &fixture.connection,
        );
        let newest = insert_test_transaction(
            UserId::new(1),
            &fixture.food,
            3.0,
            same_time + Duration::hours(1),
            &fixture.connection,
        );

        let got = list_all(&TransactionFilter::default(), &fixture);

        let got_ids: Vec<_> = got.iter().map(|transaction| transaction.id).collect();
        assert_eq!(got_ids, vec![newest.id, second.id, first.id]);
    }

    #[test]
    fn pages_do_not_overlap() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);

        let all = list_all(&TransactionFilter::default(), &fixture);

        let mut ids: Vec<_> = all.iter().map(|transaction| transaction.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn end_date_includes_the_whole_day() {
        let fixture = get_fixture();
        let late_on_end_date = insert_test_transaction(
            UserId::new(1),
            &fixture.food,
            9.0,
            datetime!(2024-03-31 23:59:59 UTC),
            &fixture.connection,
        );
        insert_test_transaction(
            UserId::new(1),
            &fixture.food,
            9.0,
            datetime!(2024-04-01 00:00 UTC),
            &fixture.connection,
        );
        let filter = TransactionFilter {
            start_date: Some("2024-03-01".to_owned()),
            end_date: Some("2024-03-31".to_owned()),
            ..Default::default()
        };

        let got = list_all(&filter, &fixture);

        assert_eq!(got, vec![late_on_end_date]);
    }

    #[test]
    fn malformed_dates_are_ignored() {
        let fixture = get_fixture();
        insert_mixed_transactions(&fixture);
        let filter = TransactionFilter {
            start_date: Some("yesterday".to_owned()),
            end_date: Some("2024-13-45".to_owned()),
            ..Default::default()
        };

        let got = list_all(&filter, &fixture);

        assert_eq!(got.len(), 30);
    }
}
