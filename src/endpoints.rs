//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/v1/transactions/{transaction_id}', use [format_endpoint].

/// Reports whether the service and its database are up.
pub const HEALTH: &str = "/health";
/// Replies with "pong".
pub const PING: &str = "/ping";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/v1/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/v1/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
/// The route for the statistics of one month.
pub const MONTHLY_STATISTICS: &str = "/api/v1/statistics/monthly";
/// The route for the statistics of one year.
pub const YEARLY_STATISTICS: &str = "/api/v1/statistics/yearly";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/categories/{category_id}', '{category_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
