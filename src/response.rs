//! The JSON envelope shared by every API response.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The body of every JSON response.
///
/// `code` repeats the HTTP status code so clients that only look at the body
/// can still tell success from failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// The HTTP status code of the response.
    pub code: u16,
    /// "success", or a description of the error.
    pub message: String,
    /// The payload, `None` for errors.
    pub data: Option<T>,
    /// When the response was created, in seconds since the Unix epoch.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn success(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: "success".to_owned(),
            data: Some(data),
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    /// An error response with a user presentable `message`.
    pub fn error(status: StatusCode, message: String) -> Self {
        Self {
            code: status.as_u16(),
            message,
            data: None,
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);

        (status, Json(self)).into_response()
    }
}

/// Shortcut for a 200 OK response carrying `data`.
pub(crate) fn ok<T: Serialize>(data: T) -> Response {
    ApiResponse::success(StatusCode::OK, data).into_response()
}

/// Shortcut for a 201 Created response carrying `data`.
pub(crate) fn created<T: Serialize>(data: T) -> Response {
    ApiResponse::success(StatusCode::CREATED, data).into_response()
}

/// A 201 Created response carrying `data` with a `Location` header pointing at
/// `location`.
pub(crate) fn created_at<T: Serialize>(location: &str, data: T) -> Response {
    let mut response = created(data);

    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(error) => tracing::warn!("Could not set Location header to {location}: {error}"),
    }

    response
}
