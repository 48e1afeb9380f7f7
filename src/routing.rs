//! Application router configuration with public and user-scoped route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    ApiResponse, AppState,
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    cors::cors_layer,
    endpoints,
    health::{get_health, get_ping},
    logging::logging_middleware,
    rate_limit::rate_limit_middleware,
    statistics::{monthly_statistics_endpoint, yearly_statistics_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
    user::require_user,
};

/// Return a router with all the app's routes.
///
/// Requests pass through the CORS layer, then the rate limiter, then the
/// logging middleware, in that order. The `/api/v1` routes additionally
/// require the user ID header.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::PING, get(get_ping))
        .method_not_allowed_fallback(get_405_method_not_allowed);

    let user_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::MONTHLY_STATISTICS, get(monthly_statistics_endpoint))
        .route(endpoints::YEARLY_STATISTICS, get(yearly_statistics_endpoint))
        .method_not_allowed_fallback(get_405_method_not_allowed)
        .layer(middleware::from_fn(require_user));

    let cors = cors_layer(&state.cors_config);

    public_routes
        .merge(user_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    ApiResponse::<()>::error(StatusCode::NOT_FOUND, "route not found".to_owned()).into_response()
}

async fn get_405_method_not_allowed() -> Response {
    ApiResponse::<()>::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_owned())
        .into_response()
}
