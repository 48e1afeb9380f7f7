//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    cors::CorsConfig,
    db::initialize,
    pagination::PaginationConfig,
    rate_limit::{RateLimitConfig, RateLimiter},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The config that controls how to page transactions.
    pub pagination_config: PaginationConfig,

    /// The rate limiter shared by every request.
    pub rate_limiter: Arc<RateLimiter>,

    /// The origins browsers may call the API from.
    pub cors_config: CorsConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the
    /// domain models and seeding the default categories.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        pagination_config: PaginationConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            pagination_config,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit_config)),
            cors_config: CorsConfig::default(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Restrict cross-origin requests to the origins in `cors_config`.
    pub fn with_cors_config(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = cors_config;
        self
    }
}
