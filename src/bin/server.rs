use std::{error::Error, net::SocketAddr, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use record_ledger::{
    AppState, CorsConfig, PaginationConfig, RateLimitConfig, build_router, graceful_shutdown,
};

/// The REST API server for record_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGER_DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 3000)]
    port: u16,

    /// The number of requests a client may make per rate limit window.
    #[arg(long, env = "LEDGER_RATE_LIMIT_MAX_REQUESTS", default_value_t = 60)]
    rate_limit_max_requests: usize,

    /// The length of the rate limit window in seconds.
    #[arg(long, env = "LEDGER_RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    rate_limit_window_secs: u64,

    /// The number of transactions per page when a request does not say.
    #[arg(long, env = "LEDGER_DEFAULT_PAGE_SIZE", default_value_t = 20)]
    default_page_size: u64,

    /// The largest number of transactions a page may hold.
    #[arg(long, env = "LEDGER_MAX_PAGE_SIZE", default_value_t = 100)]
    max_page_size: u64,

    /// Comma separated origins that browsers may call the API from. Any origin is
    /// allowed when empty.
    #[arg(long, env = "LEDGER_CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    cors_allowed_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let connection = Connection::open(&args.db_path)?;
    let pagination_config = PaginationConfig {
        default_page_size: args.default_page_size,
        max_page_size: args.max_page_size,
        ..Default::default()
    };
    let rate_limit_config = RateLimitConfig {
        max_requests: args.rate_limit_max_requests,
        window: Duration::from_secs(args.rate_limit_window_secs),
        ..Default::default()
    };
    let cors_config = CorsConfig {
        allowed_origins: args.cors_allowed_origins,
    };
    let app_state = AppState::new(connection, pagination_config, rate_limit_config)?
        .with_cors_config(cors_config);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(app_state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
