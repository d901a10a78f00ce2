//! Cache-aside status resolution.
//!
//! A lookup first checks the cache. On a miss the server is queried, the
//! result normalized into a status document, serialized, and written back
//! before being returned. Java lookups fall back to the legacy ping and then
//! to an offline document; Bedrock lookups go straight to offline.

use crate::blocklist::AddressPolicy;
use crate::error::StatusError;
use crate::helpers::Namespace;
use crate::models::{BedrockStatusResponse, JavaStatusResponse, Report, StatusResponse};
use crate::normalize;
use crate::query::StatusClient;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mcstatus_cache::{CacheStore, CacheValue, Hit};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Icon served when a server has none (embedded at compile time).
pub const DEFAULT_ICON: &[u8] = include_bytes!("../assets/default-icon.png");

/// Only PNG data URIs are decoded; anything else gets the default icon.
const FAVICON_PREFIX: &str = "data:image/png;base64,";

/// Time-to-live of each kind of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub java: Duration,
    pub bedrock: Duration,
    pub icon: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            java: Duration::from_secs(60),
            bedrock: Duration::from_secs(60),
            icon: Duration::from_secs(15 * 60),
        }
    }
}

/// Outcome of a lookup. `ttl` is set only when the value came from the cache,
/// and is then the time it has left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub ttl: Option<Duration>,
}

impl<T> Resolved<T> {
    fn cached(hit: Hit<T>) -> Self {
        Self {
            value: hit.value,
            ttl: Some(hit.ttl),
        }
    }

    fn fresh(value: T) -> Self {
        Self { value, ttl: None }
    }

    pub fn is_cached(&self) -> bool {
        self.ttl.is_some()
    }
}

/// Per-key locks so concurrent misses for one server share a single query.
#[derive(Default)]
struct InFlight {
    locks: scc::HashMap<String, Arc<Mutex<()>>>,
}

impl InFlight {
    async fn lock(&self, key: &str) -> FlightGuard<'_> {
        let mutex = Arc::clone(
            self.locks
                .entry_async(key.to_owned())
                .await
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .get(),
        );

        // Created before waiting, so a caller dropped while queued also cleans up
        let mut flight = FlightGuard {
            locks: &self.locks,
            key: key.to_owned(),
            held: None,
        };
        flight.held = Some(mutex.lock_owned().await);
        flight
    }
}

/// Holds a key's lock and drops the map entry once nobody else wants it,
/// including when the lookup holding it is cancelled.
struct FlightGuard<'a> {
    locks: &'a scc::HashMap<String, Arc<Mutex<()>>>,
    key: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        // Only the map's own reference left: nobody holds or awaits this lock
        self.locks
            .remove_if_sync(&self.key, |mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Resolves server status through the cache.
pub struct Resolver<S, C, P> {
    store: S,
    client: C,
    policy: P,
    ttl: CacheTtl,
    in_flight: InFlight,
}

impl<S, C, P> Resolver<S, C, P>
where
    S: CacheStore,
    C: StatusClient,
    P: AddressPolicy,
{
    pub fn new(store: S, client: C, policy: P, ttl: CacheTtl) -> Self {
        Self {
            store,
            client,
            policy,
            ttl,
            in_flight: InFlight::default(),
        }
    }

    /// Serialized Java Edition status document for `host:port`.
    pub async fn java_status(&self, host: &str, port: u16) -> Result<Resolved<String>, StatusError> {
        let key = Namespace::Java.key(host, port);
        self.cached_json(&key, self.ttl.java, self.fetch_java_status(host, port))
            .await
    }

    /// Serialized Bedrock Edition status document for `host:port`.
    pub async fn bedrock_status(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Resolved<String>, StatusError> {
        let key = Namespace::Bedrock.key(host, port);
        self.cached_json(&key, self.ttl.bedrock, self.fetch_bedrock_status(host, port))
            .await
    }

    /// PNG icon of a Java Edition server, or the default icon.
    pub async fn server_icon(&self, host: &str, port: u16) -> Result<Resolved<Vec<u8>>, StatusError> {
        let key = Namespace::Icon.key(host, port);

        if let Some(hit) = self.store.get_bytes(&key).await? {
            debug!(key, "icon cache hit");
            return Ok(Resolved::cached(hit));
        }

        let _flight = self.in_flight.lock(&key).await;
        self.fill_icon(&key, host, port).await
    }

    /// Query a Java Edition server without touching the cache.
    pub async fn fetch_java_status(&self, host: &str, port: u16) -> Report<JavaStatusResponse> {
        let eula_blocked = self.policy.is_blocked(host);

        match self.client.java(host, port).await {
            Ok(status) => {
                let base = StatusResponse::new(host, port, true, eula_blocked);
                return Report::Online(normalize::java_status(base, status));
            }
            Err(error) => debug!(host, port, %error, "status query failed, trying legacy ping"),
        }

        match self.client.java_legacy(host, port).await {
            Ok(status) => {
                let base = StatusResponse::new(host, port, true, eula_blocked);
                Report::Online(normalize::legacy_java_status(base, status))
            }
            Err(error) => {
                debug!(host, port, %error, "legacy ping failed, server is offline");
                Report::Offline(StatusResponse::new(host, port, false, eula_blocked))
            }
        }
    }

    /// Query a Bedrock Edition server without touching the cache.
    pub async fn fetch_bedrock_status(&self, host: &str, port: u16) -> Report<BedrockStatusResponse> {
        let eula_blocked = self.policy.is_blocked(host);

        match self.client.bedrock(host, port).await {
            Ok(status) => {
                let base = StatusResponse::new(host, port, true, eula_blocked);
                Report::Online(normalize::bedrock_status(base, status))
            }
            Err(error) => {
                debug!(host, port, %error, "bedrock query failed, server is offline");
                Report::Offline(StatusResponse::new(host, port, false, eula_blocked))
            }
        }
    }

    async fn cached_json<T: Serialize>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: impl Future<Output = T>,
    ) -> Result<Resolved<String>, StatusError> {
        if let Some(hit) = self.store.get_string(key).await? {
            debug!(key, "status cache hit");
            return Ok(Resolved::cached(hit));
        }

        let _flight = self.in_flight.lock(key).await;
        self.fill_json(key, ttl, fetch).await
    }

    async fn fill_json<T: Serialize>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: impl Future<Output = T>,
    ) -> Result<Resolved<String>, StatusError> {
        // Filled by another request while we waited for the lock
        if let Some(hit) = self.store.get_string(key).await? {
            return Ok(Resolved::cached(hit));
        }

        let body = serde_json::to_string(&fetch.await)?;
        self.store
            .set(key, CacheValue::Text(body.clone()), ttl)
            .await?;

        debug!(key, "status cached");
        Ok(Resolved::fresh(body))
    }

    async fn fill_icon(
        &self,
        key: &str,
        host: &str,
        port: u16,
    ) -> Result<Resolved<Vec<u8>>, StatusError> {
        if let Some(hit) = self.store.get_bytes(key).await? {
            return Ok(Resolved::cached(hit));
        }

        let icon = match self.client.java(host, port).await {
            Ok(status) => decode_favicon(status.favicon.as_deref())?,
            Err(error) => {
                debug!(host, port, %error, "icon query failed, using default icon");
                None
            }
        }
        .unwrap_or_else(|| DEFAULT_ICON.to_vec());

        self.store
            .set(key, CacheValue::Bytes(icon.clone()), self.ttl.icon)
            .await?;

        Ok(Resolved::fresh(icon))
    }
}

/// Decode a PNG favicon data URI.
///
/// `Ok(None)` when there is no favicon or it isn't a PNG data URI; an error
/// when it is one but the payload isn't valid base64.
pub fn decode_favicon(favicon: Option<&str>) -> Result<Option<Vec<u8>>, base64::DecodeError> {
    match favicon.and_then(|uri| uri.strip_prefix(FAVICON_PREFIX)) {
        Some(payload) => STANDARD.decode(payload).map(Some),
        None => Ok(None),
    }
}
