//! User identity as handed to the ledger by the authenticating gateway.
//!
//! Credentials are verified upstream. Requests that reach this service carry the
//! verified numeric user ID in the [USER_ID_HEADER] header and the ledger trusts
//! it without re-verifying.

use std::fmt::Display;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The header carrying the ID of the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Middleware that reads the user ID header and places the [UserId] into the request.
///
/// Requests without a positive integer user ID are rejected with
/// [Error::Unauthenticated].
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn require_user(mut request: Request, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(UserId::new);

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        None => {
            tracing::debug!(
                "Rejecting request to {} without a valid user ID",
                request.uri()
            );
            Error::Unauthenticated.into_response()
        }
    }
}
