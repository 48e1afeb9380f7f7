//! Admission control with a per-client sliding window.
//!
//! Every inbound request is checked against [RateLimiter::allow] before it
//! reaches the ledger. The limiter remembers when each client was admitted
//! and refuses a request once `max_requests` admissions fall inside the
//! trailing `window`.

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The header the gateway uses to pass on the originating client address.
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// The single-address alternative to [FORWARDED_FOR_HEADER].
const REAL_IP_HEADER: &str = "x-real-ip";

/// The rate limit policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// The number of requests a client may make within `window`.
    pub max_requests: usize,
    /// The length of the sliding window.
    pub window: Duration,
    /// Idle clients are forgotten every `sweep_interval` calls to
    /// [RateLimiter::allow]. Zero disables sweeping.
    pub sweep_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            sweep_interval: 1000,
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    /// Admission times per client key, oldest first.
    admissions: HashMap<String, VecDeque<Instant>>,
    /// Calls to `allow` since the last sweep.
    calls_since_sweep: u64,
}

/// A concurrency-safe sliding-window rate limiter keyed by client.
///
/// Construct one per service and share it with `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a rate limiter enforcing `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// The policy this limiter enforces.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decide whether the client identified by `key` may make a request now.
    ///
    /// Returns `true` and records the request if the client has made fewer than
    /// `max_requests` requests within the window, otherwise returns `false`
    /// without recording anything.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// [RateLimiter::allow] evaluated at `now` instead of the current time.
    ///
    /// Expiry, the count check and the recording of `now` happen under a single
    /// lock, so concurrent callers for the same key can never both take the
    /// last free slot.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.lock_state();
        let window_start = now.checked_sub(self.config.window);

        state.calls_since_sweep += 1;
        if self.config.sweep_interval > 0 && state.calls_since_sweep >= self.config.sweep_interval
        {
            state.calls_since_sweep = 0;
            let swept = sweep_expired(&mut state.admissions, window_start);
            if swept > 0 {
                tracing::debug!("Rate limiter forgot {swept} idle clients");
            }
        }

        let timestamps = state.admissions.entry(key.to_owned()).or_default();
        if let Some(window_start) = window_start {
            timestamps.retain(|admitted_at| *admitted_at > window_start);
        }

        if timestamps.len() >= self.config.max_requests {
            tracing::debug!(
                "Rate limit exceeded for {key}: {} requests in the last {:?}",
                timestamps.len(),
                self.config.window
            );
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Forget clients that have not been admitted within the window.
    ///
    /// Returns the number of clients removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [RateLimiter::sweep] evaluated at `now` instead of the current time.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut state = self.lock_state();
        let window_start = now.checked_sub(self.config.window);

        sweep_expired(&mut state.admissions, window_start)
    }

    /// The number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock_state().admissions.len()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep_expired(
    admissions: &mut HashMap<String, VecDeque<Instant>>,
    window_start: Option<Instant>,
) -> usize {
    let before = admissions.len();

    admissions.retain(|_, timestamps| match window_start {
        Some(window_start) => timestamps
            .back()
            .is_some_and(|latest| *latest > window_start),
        None => !timestamps.is_empty(),
    });

    before - admissions.len()
}

/// Middleware that rejects requests from clients that exceed the rate limit.
///
/// Clients are identified by their forwarded IP address, falling back to the
/// peer address. Rejected requests never reach the inner service and receive
/// [Error::RateLimited].
pub async fn rate_limit_middleware(
    State(rate_limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if !rate_limiter.allow(&key) {
        return Error::RateLimited.into_response();
    }

    next.run(request).await
}

/// The key identifying the client that sent `request`.
///
/// The ledger sits behind a gateway, so the peer address is usually the
/// gateway's own. The first address in `X-Forwarded-For` is preferred, then
/// `X-Real-IP`, and the peer address only when neither header is present.
fn client_key(request: &Request) -> String {
    let headers = request.headers();
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next());
    let real_ip = headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Some(address) = [forwarded, real_ip]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|address| !address.is_empty())
    {
        return address.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod rate_limiter_tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::{Duration, Instant},
    };

    use super::{RateLimitConfig, RateLimiter};

    fn get_limiter(max_requests: usize, window: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window,
            sweep_interval: 0,
        })
    }

    #[test]
    fn admits_up_to_max_requests_then_denies() {
        let window = Duration::from_secs(60);
        let limiter = get_limiter(3, window);
        let start = Instant::now();

        for i in 0..3 {
            assert!(
                limiter.allow_at("10.0.0.1", start + Duration::from_secs(i)),
                "request {i} should be admitted"
            );
        }

        assert!(!limiter.allow_at("10.0.0.1", start + Duration::from_secs(3)));
    }

    #[test]
    fn admits_again_after_window_passes() {
        let window = Duration::from_secs(60);
        let limiter = get_limiter(2, window);
        let start = Instant::now();
        assert!(limiter.allow_at("client", start));
        assert!(limiter.allow_at("client", start));
        assert!(!limiter.allow_at("client", start + Duration::from_secs(30)));

        let later = start + window + Duration::from_millis(1);

        assert!(limiter.allow_at("client", later));
    }

    #[test]
    fn denied_requests_are_not_recorded() {
        let window = Duration::from_secs(10);
        let limiter = get_limiter(1, window);
        let start = Instant::now();
        assert!(limiter.allow_at("client", start));

        // Repeated denials must not push the window forward.
        for i in 1..10 {
            assert!(!limiter.allow_at("client", start + Duration::from_secs(i)));
        }

        assert!(limiter.allow_at("client", start + window + Duration::from_millis(1)));
    }

    #[test]
    fn keys_are_limited_independently() {
        let limiter = get_limiter(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.allow_at("a", now));
        assert!(!limiter.allow_at("a", now));
        assert!(limiter.allow_at("b", now));
    }

    #[test]
    fn concurrent_callers_never_exceed_the_limit() {
        let max_requests = 10;
        let thread_count = 40;
        let limiter = Arc::new(get_limiter(max_requests, Duration::from_secs(60)));
        let barrier = Arc::new(Barrier::new(thread_count));

        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    barrier.wait();
                    limiter.allow("shared")
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, max_requests);
    }

    #[test]
    fn concurrent_callers_take_exactly_the_remaining_slots() {
        let max_requests = 5;
        let limiter = Arc::new(get_limiter(max_requests, Duration::from_secs(60)));
        for _ in 0..3 {
            assert!(limiter.allow("shared"));
        }
        let thread_count = 16;
        let barrier = Arc::new(Barrier::new(thread_count));

        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    barrier.wait();
                    limiter.allow("shared")
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 2);
    }

    #[test]
    fn sweep_forgets_idle_clients() {
        let window = Duration::from_secs(60);
        let limiter = get_limiter(5, window);
        let start = Instant::now();
        limiter.allow_at("idle", start);
        limiter.allow_at("active", start + Duration::from_secs(50));

        let removed = limiter.sweep_at(start + Duration::from_secs(61));

        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn periodic_sweep_runs_inside_allow() {
        let window = Duration::from_secs(1);
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window,
            sweep_interval: 3,
        });
        let start = Instant::now();
        limiter.allow_at("a", start);
        limiter.allow_at("b", start);

        limiter.allow_at("c", start + Duration::from_secs(5));

        assert_eq!(limiter.tracked_clients(), 1);
    }
}

#[cfg(test)]
mod rate_limit_middleware_tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;

    use crate::ApiResponse;

    use super::{RateLimitConfig, RateLimiter, rate_limit_middleware};

    fn get_test_server(max_requests: usize) -> TestServer {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            sweep_interval: 0,
        }));

        let app = Router::new()
            .route("/", get(|| async { "hello" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn rejects_requests_over_the_limit() {
        let server = get_test_server(2);

        server.get("/").await.assert_status_ok();
        server.get("/").await.assert_status_ok();
        let response = server.get("/").await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        let body = response.json::<ApiResponse<()>>();
        assert_eq!(body.code, 429);
    }

    #[tokio::test]
    async fn forwarded_clients_have_separate_budgets() {
        let server = get_test_server(1);

        server
            .get("/")
            .add_header("x-forwarded-for", "203.0.113.1")
            .await
            .assert_status_ok();
        server
            .get("/")
            .add_header("x-forwarded-for", "203.0.113.2, 10.0.0.1")
            .await
            .assert_status_ok();
        server
            .get("/")
            .add_header("x-forwarded-for", "203.0.113.1")
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn clients_behind_one_gateway_have_separate_budgets() {
        let server = get_test_server(1);

        server
            .get("/")
            .add_header("x-real-ip", "198.51.100.7")
            .await
            .assert_status_ok();
        server
            .get("/")
            .add_header("x-real-ip", "198.51.100.8")
            .await
            .assert_status_ok();
        server
            .get("/")
            .add_header("x-real-ip", "198.51.100.7")
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}
