//! Advisory memoization of successful GET responses.

use crate::types::{ApiResponse, ExecutionParams};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Default time-to-live, matching the dashboard's five-minute stale time.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Operation id plus the canonical JSON form of the parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(operation_id: &str, params: &ExecutionParams) -> Self {
        // Maps serialize with sorted keys, so equal parameter sets give equal keys.
        let canonical = serde_json::to_string(params).unwrap_or_default();
        Self(format!("{operation_id}:{canonical}"))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: ApiResponse,
    stored_at: Instant,
}

/// Concurrent TTL cache. A miss never blocks a fresh network call.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: DashMap<CacheKey, CacheEntry>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh entry, if any. Expired entries are evicted on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<ApiResponse> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.response.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Store a response. Expired entries for any key are dropped first, so
    /// the map never outgrows the set of parameter combinations seen within
    /// one TTL window.
    pub fn insert(&self, key: CacheKey, response: ApiResponse) {
        self.purge_expired();
        self.entries.insert(
            key,
            CacheEntry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }
}
