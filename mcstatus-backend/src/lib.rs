pub mod blocklist;
pub mod config;
mod error;
pub mod helpers;
pub mod models;
pub mod normalize;
pub mod ping;
pub mod query;
pub mod resolver;
mod routes;
pub mod text;
mod validation;

pub use error::{ErrorResponse, StatusError};

use axum::{Router, http::StatusCode, routing::get};
use blocklist::AddressPolicy;
use mcstatus_cache::CacheStore;
use query::StatusClient;
use resolver::Resolver;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct AppState<S, C, P> {
    pub resolver: Resolver<S, C, P>,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for status and icon endpoints
    pub per_sec: u64,
    /// Burst size for status and icon endpoints
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: 10,
            burst: 20,
        }
    }
}

/// Create the application router around a resolver
pub fn create_app<S, C, P>(
    resolver: Resolver<S, C, P>,
    request_timeout: Duration,
    rate_limit: RateLimitConfig,
) -> Router
where
    S: CacheStore,
    C: StatusClient,
    P: AddressPolicy,
{
    let state = Arc::new(AppState { resolver });

    // Every lookup may hit an upstream server, so limit per client IP
    let governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.per_sec.max(1))
        .burst_size(rate_limit.burst.max(1))
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("rate limit values are non-zero");

    let status_routes = Router::new()
        .route("/status/java/{address}", get(routes::java_status::<S, C, P>))
        .route("/status/bedrock/{address}", get(routes::bedrock_status::<S, C, P>))
        .route("/icon/{address}", get(routes::icon::<S, C, P>))
        .layer(GovernorLayer::new(governor));

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(status_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
