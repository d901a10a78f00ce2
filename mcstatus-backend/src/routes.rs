use crate::AppState;
use crate::blocklist::AddressPolicy;
use crate::error::AppError;
use crate::helpers::{BEDROCK_DEFAULT_PORT, JAVA_DEFAULT_PORT};
use crate::query::StatusClient;
use crate::resolver::Resolved;
use crate::validation;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use mcstatus_cache::CacheStore;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const CACHE_HIT: HeaderName = HeaderName::from_static("x-cache-hit");
pub(crate) const CACHE_TIME_REMAINING: HeaderName =
    HeaderName::from_static("x-cache-time-remaining");

pub(crate) async fn java_status<S, C, P>(
    State(state): State<Arc<AppState<S, C, P>>>,
    Path(address): Path<String>,
) -> Result<Response, AppError>
where
    S: CacheStore,
    C: StatusClient,
    P: AddressPolicy,
{
    let (host, port) = validation::parse_address(&address, JAVA_DEFAULT_PORT)?;

    let status = state.resolver.java_status(&host, port).await?;

    Ok(with_cache_headers("application/json", status))
}

pub(crate) async fn bedrock_status<S, C, P>(
    State(state): State<Arc<AppState<S, C, P>>>,
    Path(address): Path<String>,
) -> Result<Response, AppError>
where
    S: CacheStore,
    C: StatusClient,
    P: AddressPolicy,
{
    let (host, port) = validation::parse_address(&address, BEDROCK_DEFAULT_PORT)?;

    let status = state.resolver.bedrock_status(&host, port).await?;

    Ok(with_cache_headers("application/json", status))
}

pub(crate) async fn icon<S, C, P>(
    State(state): State<Arc<AppState<S, C, P>>>,
    Path(address): Path<String>,
) -> Result<Response, AppError>
where
    S: CacheStore,
    C: StatusClient,
    P: AddressPolicy,
{
    let (host, port) = validation::parse_address(&address, JAVA_DEFAULT_PORT)?;

    let icon = state.resolver.server_icon(&host, port).await?;

    Ok(with_cache_headers("image/png", icon))
}

/// Body with its content type, plus whether it came from the cache and for how much longer.
fn with_cache_headers<T>(content_type: &'static str, resolved: Resolved<T>) -> Response
where
    T: IntoResponse,
{
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    cache_headers(&mut headers, resolved.ttl);

    (headers, resolved.value).into_response()
}

fn cache_headers(headers: &mut HeaderMap, ttl: Option<Duration>) {
    let hit = if ttl.is_some() { "true" } else { "false" };
    headers.insert(CACHE_HIT, HeaderValue::from_static(hit));

    if let Some(ttl) = ttl {
        headers.insert(CACHE_TIME_REMAINING, HeaderValue::from(ttl.as_secs()));
    }
}
