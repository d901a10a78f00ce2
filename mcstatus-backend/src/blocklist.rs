//! EULA blocklist lookups.
//!
//! Mojang publishes the blocked server list as SHA-1 hashes of lowercase host
//! patterns, one per line. A pattern is either an exact host, a `*.`-prefixed
//! domain suffix, or an IPv4 prefix ending in `.*`.

use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Decides whether a host is blocked. Consulted once per resolution.
pub trait AddressPolicy: Send + Sync + 'static {
    fn is_blocked(&self, host: &str) -> bool;
}

impl<T: AddressPolicy> AddressPolicy for Arc<T> {
    fn is_blocked(&self, host: &str) -> bool {
        (**self).is_blocked(host)
    }
}

/// Lowercase hex SHA-1 of a host pattern, as published by Mojang.
pub fn hash_host(pattern: &str) -> String {
    format!("{:x}", Sha1::digest(pattern.as_bytes()))
}

/// Blocked server hashes, replaceable at runtime.
#[derive(Debug, Default)]
pub struct BlockedServers {
    hashes: RwLock<HashSet<String>>,
}

impl BlockedServers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: RwLock::new(
                hashes
                    .into_iter()
                    .map(|hash| hash.as_ref().trim().to_ascii_lowercase())
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swap in a new hash set.
    pub fn replace(&self, hashes: HashSet<String>) {
        *self.hashes.write().unwrap_or_else(PoisonError::into_inner) = hashes;
    }

    /// Download the list from `url` and replace the current set.
    /// On error the current set is left untouched.
    pub async fn refresh(&self, client: &reqwest::Client, url: &str) -> Result<usize, reqwest::Error> {
        let body = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let hashes = parse_hashes(&body);
        let count = hashes.len();
        self.replace(hashes);

        info!(count, "refreshed blocked server list");
        Ok(count)
    }
}

impl AddressPolicy for BlockedServers {
    fn is_blocked(&self, host: &str) -> bool {
        let hashes = self.hashes.read().unwrap_or_else(PoisonError::into_inner);
        if hashes.is_empty() {
            return false;
        }

        patterns(host)
            .iter()
            .any(|pattern| hashes.contains(&hash_host(pattern)))
    }
}

fn parse_hashes(body: &str) -> HashSet<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Every pattern that would block `host`, most specific first.
fn patterns(host: &str) -> Vec<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let mut patterns = Vec::new();

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        let [a, b, c, _] = ip.octets();
        patterns.push(format!("{a}.{b}.{c}.*"));
        patterns.push(format!("{a}.{b}.*"));
        patterns.push(format!("{a}.*"));
    } else {
        let labels: Vec<&str> = host.split('.').collect();
        for start in 1..labels.len() {
            patterns.push(format!("*.{}", labels[start..].join(".")));
        }
    }

    patterns.insert(0, host);
    patterns
}
