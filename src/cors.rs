//! Cross-origin resource sharing for browser clients.

use axum::http::{
    HeaderName, HeaderValue, Method,
    header::{
        ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE,
        LOCATION, ORIGIN,
    },
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// The origins that browsers may call the API from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Exact origins such as `https://ledger.example.com`.
    ///
    /// An empty list allows any origin by echoing the request's `Origin`.
    pub allowed_origins: Vec<String>,
}

/// Build the CORS layer for `config`.
///
/// Origins that are not valid header values are logged and skipped.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim())
                .inspect_err(|error| tracing::warn!("Ignoring CORS origin {origin:?}: {error}"))
                .ok()
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            ORIGIN,
            CONTENT_LENGTH,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            ACCEPT,
            ACCEPT_ENCODING,
            ACCEPT_LANGUAGE,
        ])
        .expose_headers([CONTENT_LENGTH, CONTENT_TYPE, LOCATION])
}

#[cfg(test)]
mod cors_tests {
    use axum::{
        Router,
        http::{Method, StatusCode},
        routing::get,
    };
    use axum_test::TestServer;

    use super::{CorsConfig, cors_layer};

    fn get_test_server(config: CorsConfig) -> TestServer {
        let app = Router::new()
            .route("/", get(|| async { "hello" }))
            .layer(cors_layer(&config));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn echoes_any_origin_by_default() {
        let server = get_test_server(CorsConfig::default());

        let response = server
            .get("/")
            .add_header("origin", "http://localhost:5173")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn only_listed_origins_are_allowed() {
        let server = get_test_server(CorsConfig {
            allowed_origins: vec!["https://ledger.example.com".to_owned()],
        });

        let allowed = server
            .method(Method::OPTIONS, "/")
            .add_header("origin", "https://ledger.example.com")
            .add_header("access-control-request-method", "GET")
            .await;
        let denied = server
            .method(Method::OPTIONS, "/")
            .add_header("origin", "https://evil.example.com")
            .add_header("access-control-request-method", "GET")
            .await;

        allowed.assert_status(StatusCode::OK);
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://ledger.example.com"
        );
        assert!(
            denied
                .headers()
                .get("access-control-allow-origin")
                .is_none()
        );
    }
}
