//! Cache-aside storage for status lookups.
//!
//! `CacheStore` is the seam the resolver talks to. `MemoryCache` is the
//! in-process implementation: a lock-free map of entries that expire after
//! their time-to-live. Cached data is recomputed from the upstream server on a
//! miss, so durability isn't needed.

mod error;
mod models;

pub use error::{CacheError, Result};
pub use models::{CacheValue, Hit};

use models::Entry;
use scc::hash_map::Entry as MapEntry;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Key/value store with per-entry time-to-live.
///
/// `Ok(None)` means "not cached"; an `Err` is a store failure and is never
/// reported as a miss.
pub trait CacheStore: Send + Sync + 'static {
  /// Look up a text value and its remaining TTL.
  fn get_string(&self, key: &str) -> impl Future<Output = Result<Option<Hit<String>>>> + Send;

  /// Look up a byte value and its remaining TTL.
  fn get_bytes(&self, key: &str) -> impl Future<Output = Result<Option<Hit<Vec<u8>>>>> + Send;

  /// Store a value, replacing whatever was under `key`.
  fn set(&self, key: &str, value: CacheValue, ttl: Duration)
  -> impl Future<Output = Result<()>> + Send;
}

impl<T: CacheStore> CacheStore for Arc<T> {
  fn get_string(&self, key: &str) -> impl Future<Output = Result<Option<Hit<String>>>> + Send {
    (**self).get_string(key)
  }

  fn get_bytes(&self, key: &str) -> impl Future<Output = Result<Option<Hit<Vec<u8>>>>> + Send {
    (**self).get_bytes(key)
  }

  fn set(
    &self,
    key: &str,
    value: CacheValue,
    ttl: Duration,
  ) -> impl Future<Output = Result<()>> + Send {
    (**self).set(key, value, ttl)
  }
}

/// In-memory TTL cache.
/// Uses scc::HashMap for lock-free concurrent access from many requests.
pub struct MemoryCache {
  entries: scc::HashMap<String, Entry>,
  capacity: Option<usize>,
}

impl MemoryCache {
  /// Create an unbounded cache.
  pub fn new() -> Self {
    Self {
      entries: scc::HashMap::new(),
      capacity: None,
    }
  }

  /// Create a cache holding at most `capacity` entries. A new key arriving at a
  /// full cache first displaces expired entries, then the one closest to expiry.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: scc::HashMap::new(),
      capacity: Some(capacity),
    }
  }

  /// Number of stored entries, including expired ones not yet purged.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Drop every expired entry. Returns how many were removed.
  pub async fn purge_expired(&self) -> usize {
    let now = Instant::now();
    let before = self.entries.len();
    self.entries.retain_async(|_, entry| !entry.is_expired(now)).await;
    let purged = before.saturating_sub(self.entries.len());

    if purged > 0 {
      debug!(purged, "purged expired cache entries");
    }

    purged
  }

  /// Copy out a live entry's value and remaining TTL.
  async fn read(&self, key: &str) -> Option<(CacheValue, Duration)> {
    let now = Instant::now();
    self
      .entries
      .read_async(key, |_, entry| {
        (!entry.is_expired(now)).then(|| (entry.value.clone(), entry.remaining(now)))
      })
      .await
      .flatten()
  }

  async fn make_room(&self, key: &str) {
    let Some(capacity) = self.capacity else {
      return;
    };

    if self.entries.len() < capacity {
      return;
    }

    // Overwriting an existing key never grows the map
    if self.entries.read_async(key, |_, _| ()).await.is_some() {
      return;
    }

    self.purge_expired().await;
    while self.entries.len() >= capacity.max(1) {
      if !self.evict_soonest_expiring().await {
        break;
      }
    }
  }

  /// Remove the live entry with the earliest expiry. Returns false if the map is empty.
  async fn evict_soonest_expiring(&self) -> bool {
    let mut victim: Option<(String, Instant)> = None;
    self
      .entries
      .iter_async(|key, entry| {
        if victim.as_ref().is_none_or(|(_, soonest)| entry.expires_at < *soonest) {
          victim = Some((key.clone(), entry.expires_at));
        }
        true
      })
      .await;

    let Some((key, expires_at)) = victim else {
      return false;
    };

    // Skip it if a concurrent set refreshed the entry meanwhile
    self
      .entries
      .remove_if_async(&key, |entry| entry.expires_at == expires_at)
      .await;
    debug!(%key, "evicted cache entry to make room");
    true
  }
}

impl Default for MemoryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl CacheStore for MemoryCache {
  async fn get_string(&self, key: &str) -> Result<Option<Hit<String>>> {
    match self.read(key).await {
      Some((CacheValue::Text(value), ttl)) => Ok(Some(Hit { value, ttl })),
      Some((other, _)) => {
        debug!(key, kind = other.kind(), "cached value has unexpected kind");
        Err(CacheError::TypeMismatch {
          key: key.to_owned(),
          expected: "text",
        })
      }
      None => Ok(None),
    }
  }

  async fn get_bytes(&self, key: &str) -> Result<Option<Hit<Vec<u8>>>> {
    match self.read(key).await {
      Some((CacheValue::Bytes(value), ttl)) => Ok(Some(Hit { value, ttl })),
      Some((other, _)) => {
        debug!(key, kind = other.kind(), "cached value has unexpected kind");
        Err(CacheError::TypeMismatch {
          key: key.to_owned(),
          expected: "bytes",
        })
      }
      None => Ok(None),
    }
  }

  async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
    self.make_room(key).await;

    let entry = Entry::new(value, ttl, Instant::now());
    match self.entries.entry_async(key.to_owned()).await {
      MapEntry::Occupied(mut occupied) => {
        *occupied.get_mut() = entry;
      }
      MapEntry::Vacant(vacant) => {
        vacant.insert_entry(entry);
      }
    }

    Ok(())
  }
}
