use std::time::{Duration, Instant};

/// Longest lifetime an entry is given; longer TTLs are clamped to it.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A value stored in the cache. Status documents are text, server icons are bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
  Text(String),
  Bytes(Vec<u8>),
}

impl CacheValue {
  pub(crate) fn kind(&self) -> &'static str {
    match self {
      CacheValue::Text(_) => "text",
      CacheValue::Bytes(_) => "bytes",
    }
  }
}

impl From<String> for CacheValue {
  fn from(value: String) -> Self {
    CacheValue::Text(value)
  }
}

impl From<&str> for CacheValue {
  fn from(value: &str) -> Self {
    CacheValue::Text(value.to_owned())
  }
}

impl From<Vec<u8>> for CacheValue {
  fn from(value: Vec<u8>) -> Self {
    CacheValue::Bytes(value)
  }
}

/// A cache hit: the stored value and how long it has left to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<T> {
  pub value: T,
  pub ttl: Duration,
}

/// A stored value with its absolute expiry.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
  pub(crate) value: CacheValue,
  pub(crate) expires_at: Instant,
}

impl Entry {
  pub(crate) fn new(value: CacheValue, ttl: Duration, now: Instant) -> Self {
    Self {
      value,
      expires_at: now + ttl.min(MAX_TTL),
    }
  }

  pub(crate) fn is_expired(&self, now: Instant) -> bool {
    now >= self.expires_at
  }

  /// Time left before expiry (zero once expired)
  pub(crate) fn remaining(&self, now: Instant) -> Duration {
    self.expires_at.saturating_duration_since(now)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_huge_ttl_is_clamped() {
    let now = Instant::now();
    let entry = Entry::new("{}".into(), Duration::MAX, now);

    assert!(!entry.is_expired(now));
    assert_eq!(entry.remaining(now), MAX_TTL);
  }

  #[test]
  fn test_zero_ttl_expires_immediately() {
    let now = Instant::now();
    let entry = Entry::new("{}".into(), Duration::ZERO, now);

    assert!(entry.is_expired(now));
    assert_eq!(entry.remaining(now), Duration::ZERO);
  }
}
