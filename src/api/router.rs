//! HTTP routing configuration with per-IP rate limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use governor::{Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::AppState;
use crate::domain::ErrorBody;

use super::handlers::{
    add_to_whitelist_handler, health_check_handler, list_auctions_handler, list_nfts_handler,
    liveness_handler, metrics_handler, readiness_handler, remove_from_whitelist_handler,
    update_price_handler,
};
use super::middleware::auth_middleware;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for admin write endpoints
    pub admin_rps: u32,
    /// Burst size for admin write endpoints
    pub admin_burst: u32,
    /// Requests per second for public read endpoints
    pub public_rps: u32,
    /// Burst size for public read endpoints
    pub public_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            admin_rps: 5,
            admin_burst: 10,
            public_rps: 50,
            public_burst: 100,
        }
    }
}

impl RateLimitConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let read = |key: &str, fallback: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            admin_rps: read("RATE_LIMIT_ADMIN_RPS", defaults.admin_rps),
            admin_burst: read("RATE_LIMIT_ADMIN_BURST", defaults.admin_burst),
            public_rps: read("RATE_LIMIT_PUBLIC_RPS", defaults.public_rps),
            public_burst: read("RATE_LIMIT_PUBLIC_BURST", defaults.public_burst),
        }
    }
}

type KeyedLimiter = RateLimiter<
    IpAddr,
    governor::state::keyed::DashMapStateStore<IpAddr>,
    governor::clock::DefaultClock,
>;

/// Shared rate limiter state (keyed by client IP to prevent global DoS).
pub struct RateLimitState {
    admin_limiter: KeyedLimiter,
    public_limiter: KeyedLimiter,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        let admin_quota = Quota::per_second(NonZeroU32::new(config.admin_rps).unwrap())
            .allow_burst(NonZeroU32::new(config.admin_burst).unwrap());
        let public_quota = Quota::per_second(NonZeroU32::new(config.public_rps).unwrap())
            .allow_burst(NonZeroU32::new(config.public_burst).unwrap());

        Self {
            admin_limiter: RateLimiter::dashmap(admin_quota),
            public_limiter: RateLimiter::dashmap(public_quota),
            config,
        }
    }
}

/// Extract client IP from request (X-Forwarded-For, X-Real-IP, or ConnectInfo).
/// Falls back to 0.0.0.0 when unknown to avoid blocking; unknown clients share one bucket.
fn client_ip_from_request<B>(request: &Request<B>) -> IpAddr {
    // Prefer proxy headers (client is first in X-Forwarded-For)
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(s) = forwarded.to_str() {
            if let Some(first) = s.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }
    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(s) = real_ip.to_str() {
            if let Ok(ip) = s.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }
    if let Some(addr) = request.extensions().get::<SocketAddr>() {
        return addr.ip();
    }
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response<Body> {
    let body = ErrorBody {
        status_code: StatusCode::TOO_MANY_REQUESTS.as_u16(),
        message: "Rate limit exceeded. Please slow down your requests.".to_string(),
        error_type: "rate_limited".to_string(),
        timestamp: Utc::now(),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", limit.to_string().parse().unwrap());
    headers.insert("X-RateLimit-Remaining", "0".parse().unwrap());
    headers.insert("Retry-After", retry_after.to_string().parse().unwrap());
    response
}

/// Rate limit middleware for admin write endpoints (per-IP).
async fn rate_limit_admin_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    match rate_limit.admin_limiter.check_key(&client_ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                &governor::clock::DefaultClock::default(),
            ));
            rate_limited_response(rate_limit.config.admin_rps, wait_time.as_secs())
        }
    }
}

/// Rate limit middleware for public read endpoints (per-IP).
async fn rate_limit_public_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    match rate_limit.public_limiter.check_key(&client_ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                &governor::clock::DefaultClock::default(),
            ));
            rate_limited_response(rate_limit.config.public_rps, wait_time.as_secs())
        }
    }
}

fn admin_routes(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/price", axum::routing::patch(update_price_handler))
        .route(
            "/whitelist",
            axum::routing::patch(add_to_whitelist_handler)
                .delete(remove_from_whitelist_handler),
        )
        .layer(middleware::from_fn_with_state(app_state, auth_middleware))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler))
}

/// Create router without rate limiting.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CorsLayer::permissive());

    let contract_routes = Router::new()
        .route("/nfts", get(list_nfts_handler))
        .route("/auctions", get(list_auctions_handler))
        .nest("/admin/sales", admin_routes(Arc::clone(&app_state)));

    Router::new()
        .nest("/contract", contract_routes)
        .nest("/health", health_routes())
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
}

/// Create router with rate limiting enabled.
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(config));

    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CorsLayer::permissive());

    let contract_routes = Router::new()
        .route("/nfts", get(list_nfts_handler))
        .route("/auctions", get(list_auctions_handler))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&rate_limit_state),
            rate_limit_public_middleware,
        ))
        .nest(
            "/admin/sales",
            admin_routes(Arc::clone(&app_state)).layer(middleware::from_fn_with_state(
                Arc::clone(&rate_limit_state),
                rate_limit_admin_middleware,
            )),
        );

    Router::new()
        .nest("/contract", contract_routes)
        .nest("/health", health_routes())
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
}
