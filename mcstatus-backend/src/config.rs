use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;

use crate::RateLimitConfig;
use crate::resolver::CacheTtl;

/// Mojang's published list of blocked server hashes.
pub const DEFAULT_BLOCKLIST_URL: &str = "https://sessionserver.mojang.com/blockedservers";

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    /// Env: PORT (default: 3000)
    pub port: u16,

    /// Request timeout in seconds
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Upper bound on a single upstream status query
    /// Env: QUERY_TIMEOUT_MS (default: 5000)
    pub query_timeout: Duration,

    /// How long Java Edition statuses are cached
    /// Env: JAVA_CACHE_TTL_SECS (default: 60)
    pub java_cache_ttl: Duration,

    /// How long Bedrock Edition statuses are cached
    /// Env: BEDROCK_CACHE_TTL_SECS (default: 60)
    pub bedrock_cache_ttl: Duration,

    /// How long server icons are cached
    /// Env: ICON_CACHE_TTL_SECS (default: 900)
    pub icon_cache_ttl: Duration,

    /// Maximum number of cache entries
    /// Env: CACHE_MAX_ENTRIES (default: 100000)
    pub cache_max_entries: usize,

    /// How often expired cache entries are purged
    /// Env: CACHE_PURGE_INTERVAL_SECS (default: 60)
    pub cache_purge_interval: Duration,

    /// Where to download the blocked server list from
    /// Env: BLOCKLIST_URL (default: Mojang's list, empty string disables)
    pub blocklist_url: Option<String>,

    /// How often the blocked server list is refreshed
    /// Env: BLOCKLIST_REFRESH_SECS (default: 3600)
    pub blocklist_refresh: Duration,

    /// Rate limit for status endpoints (requests per second, per IP)
    /// Env: RATE_LIMIT_PER_SEC (default: 10)
    pub rate_limit_per_sec: u64,

    /// Burst size for status endpoints
    /// Env: RATE_LIMIT_BURST (default: 20)
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let _ = dotenv(); //for debugging mostly
        let blocklist_url = env_or_default_string("BLOCKLIST_URL", DEFAULT_BLOCKLIST_URL);

        Self {
            port: env_or_default("PORT", 3000),
            request_timeout: env_period("REQUEST_TIMEOUT_SECS", 30, Duration::from_secs),
            query_timeout: env_period("QUERY_TIMEOUT_MS", 5000, Duration::from_millis),
            java_cache_ttl: Duration::from_secs(env_or_default("JAVA_CACHE_TTL_SECS", 60)),
            bedrock_cache_ttl: Duration::from_secs(env_or_default("BEDROCK_CACHE_TTL_SECS", 60)),
            icon_cache_ttl: Duration::from_secs(env_or_default("ICON_CACHE_TTL_SECS", 900)),
            cache_max_entries: env_or_default("CACHE_MAX_ENTRIES", 100_000),
            cache_purge_interval: env_period("CACHE_PURGE_INTERVAL_SECS", 60, Duration::from_secs),
            blocklist_url: (!blocklist_url.trim().is_empty()).then_some(blocklist_url),
            blocklist_refresh: env_period("BLOCKLIST_REFRESH_SECS", 3600, Duration::from_secs),
            rate_limit_per_sec: env_or_default("RATE_LIMIT_PER_SEC", 10),
            rate_limit_burst: env_or_default("RATE_LIMIT_BURST", 20),
        }
    }

    /// Cache lifetimes for the resolver
    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            java: self.java_cache_ttl,
            bedrock: self.bedrock_cache_ttl,
            icon: self.icon_cache_ttl,
        }
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            per_sec: self.rate_limit_per_sec,
            burst: self.rate_limit_burst,
        }
    }
}

impl Default for Config {
    /// Create configuration with all default values
    fn default() -> Self {
        Self {
            port: 3000,
            request_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(5),
            java_cache_ttl: Duration::from_secs(60),
            bedrock_cache_ttl: Duration::from_secs(60),
            icon_cache_ttl: Duration::from_secs(15 * 60),
            cache_max_entries: 100_000,
            cache_purge_interval: Duration::from_secs(60),
            blocklist_url: Some(DEFAULT_BLOCKLIST_URL.to_string()),
            blocklist_refresh: Duration::from_secs(60 * 60),
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
        }
    }
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse a period that must not be zero, in the given unit
fn env_period(key: &str, default: u64, unit: fn(u64) -> Duration) -> Duration {
    unit(nonzero_or_default(key, env_or_default(key, default), default))
}

fn nonzero_or_default(key: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        tracing::warn!(key, default, "Zero is not a valid period, using the default");
        return default;
    }
    value
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.query_timeout, Duration::from_millis(5000));
        assert_eq!(config.cache_max_entries, 100_000);
        assert_eq!(config.blocklist_url.as_deref(), Some(DEFAULT_BLOCKLIST_URL));
        assert_eq!(config.rate_limit_per_sec, 10);
        assert_eq!(config.rate_limit_burst, 20);
    }

    #[test]
    fn test_default_ttls_match_resolver_defaults() {
        assert_eq!(Config::default().cache_ttl(), CacheTtl::default());
    }

    #[test]
    fn test_env_or_default_falls_back() {
        assert_eq!(env_or_default("MCSTATUS_TEST_UNSET_VARIABLE", 42u16), 42);
        assert_eq!(
            env_or_default_string("MCSTATUS_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn test_zero_period_falls_back() {
        assert_eq!(nonzero_or_default("CACHE_PURGE_INTERVAL_SECS", 0, 60), 60);
        assert_eq!(nonzero_or_default("CACHE_PURGE_INTERVAL_SECS", 5, 60), 5);
        assert_eq!(
            env_period("MCSTATUS_TEST_UNSET_VARIABLE", 3600, Duration::from_secs),
            Duration::from_secs(3600)
        );
    }
}
