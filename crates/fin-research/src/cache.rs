//! Time-boxed caching of provider responses
//!
//! Entries expire a fixed duration after insertion and are evicted lazily when
//! a lookup finds them stale; nothing sweeps the cache in the background.
//! Time comes from an injected [`Clock`] so expiry can be driven by tests.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::ResearchConfig;

/// Source of the current time for cache expiry
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + offset
    }
}

/// Cache key: which tool was called with which argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Tool or endpoint name, e.g. "symbol_search"
    pub tool: String,
    /// The single argument the tool was called with
    pub argument: String,
}

impl CacheKey {
    pub fn new(tool: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            argument: argument.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tool, self.argument)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Thread-safe TTL cache holding JSON snapshots of typed records
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    /// Create a new cache with the given TTL and clock
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    /// Create a cache driven by the system clock
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live value, evicting it if it has expired
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                tracing::debug!("Cache entry expired: {}", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a value; it expires `ttl` after now
    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Get or fetch a typed value
    ///
    /// On a hit the stored snapshot is deserialized and returned without calling
    /// `fetcher`. On a miss the fetcher runs and a successful result is stored;
    /// errors are never cached.
    pub async fn get_or_fetch<T, F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key).await {
            match serde_json::from_value::<T>(value) {
                Ok(hit) => {
                    tracing::debug!("Cache hit for {}", key);
                    return Ok(hit);
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                    self.invalidate(&key).await;
                }
            }
        }

        tracing::debug!("Cache miss for {}", key);

        let fetched = fetcher().await?;

        match serde_json::to_value(&fetched) {
            Ok(value) => self.insert(key, value).await,
            Err(e) => tracing::warn!("Not caching {}: {}", key, e),
        }

        Ok(fetched)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Number of stored entries, including expired ones not yet looked up
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// The caches a pipeline shares, one per kind of data
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Raw ticker-search responses, keyed by query
    pub search: TtlCache,
    /// Profiles, statements and price series, keyed by symbol
    pub market: TtlCache,
    /// News results, keyed by company name
    pub news: TtlCache,
}

impl CacheManager {
    /// Create caches with the configured TTLs, all reading the same clock
    pub fn new(config: &ResearchConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            search: TtlCache::new(config.cache_ttl_search, Arc::clone(&clock)),
            market: TtlCache::new(config.cache_ttl_market, Arc::clone(&clock)),
            news: TtlCache::new(config.cache_ttl_news, clock),
        }
    }

    /// Create caches driven by the system clock
    pub fn with_system_clock(config: &ResearchConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Clear all caches
    pub async fn clear_all(&self) {
        self.search.clear().await;
        self.market.clear().await;
        self.news.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        symbol: String,
        close: f64,
    }

    fn manual_cache(ttl_secs: u64) -> (TtlCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let (cache, _clock) = manual_cache(60);
        let key = CacheKey::new("profile", "AAPL");
        let value = serde_json::json!({"long_name": "Apple Inc."});

        cache.insert(key.clone(), value.clone()).await;
        assert_eq!(cache.get(&key).await, Some(value));
    }

    #[tokio::test]
    async fn test_expired_entry_evicted_on_lookup() {
        let (cache, clock) = manual_cache(900);
        let key = CacheKey::new("symbol_search", "Apple");
        cache.insert(key.clone(), serde_json::json!([])).await;

        clock.advance(Duration::from_secs(899));
        assert!(cache.get(&key).await.is_some());

        clock.advance(Duration::from_secs(1));
        // Still stored until someone looks it up
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_or_fetch_calls_fetcher_once_within_ttl() {
        let (cache, clock) = manual_cache(60);
        let key = CacheKey::new("history", "MSFT");
        let snapshot = Snapshot {
            symbol: "MSFT".to_string(),
            close: 415.5,
        };

        let mut call_count = 0;
        let first: Snapshot = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                let s = snapshot.clone();
                async move { Ok::<_, String>(s) }
            })
            .await
            .unwrap();
        assert_eq!(call_count, 1);

        clock.advance(Duration::from_secs(30));
        let second: Snapshot = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Err::<Snapshot, _>("should not be called".to_string()) }
            })
            .await
            .unwrap();
        assert_eq!(call_count, 1);
        assert_eq!(first, second);

        clock.advance(Duration::from_secs(31));
        let third: Snapshot = cache
            .get_or_fetch(key, || {
                call_count += 1;
                let s = snapshot.clone();
                async move { Ok::<_, String>(s) }
            })
            .await
            .unwrap();
        assert_eq!(call_count, 2);
        assert_eq!(third, snapshot);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (cache, _clock) = manual_cache(60);
        let key = CacheKey::new("profile", "ZZZZ");

        let result: Result<Snapshot, String> = cache
            .get_or_fetch(key.clone(), || async { Err("boom".to_string()) })
            .await;
        assert!(result.is_err());
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_entry_refetched() {
        let (cache, _clock) = manual_cache(60);
        let key = CacheKey::new("history", "AAPL");
        cache.insert(key.clone(), serde_json::json!("not a snapshot")).await;

        let value: Snapshot = cache
            .get_or_fetch(key, || async {
                Ok::<_, String>(Snapshot {
                    symbol: "AAPL".to_string(),
                    close: 190.0,
                })
            })
            .await
            .unwrap();
        assert_eq!(value.symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_cache_manager_shares_clock() {
        let clock = Arc::new(ManualClock::new());
        let config = ResearchConfig::default();
        let manager = CacheManager::new(&config, clock.clone());
        let key = CacheKey::new("any", "x");

        manager.search.insert(key.clone(), serde_json::json!(1)).await;
        manager.market.insert(key.clone(), serde_json::json!(2)).await;
        manager.news.insert(key.clone(), serde_json::json!(3)).await;

        // Search expires at 15 minutes, market data and news at 30
        clock.advance(Duration::from_secs(16 * 60));
        assert!(manager.search.get(&key).await.is_none());
        assert!(manager.market.get(&key).await.is_some());
        assert!(manager.news.get(&key).await.is_some());

        manager.clear_all().await;
        assert!(manager.market.is_empty().await);
        assert!(manager.news.is_empty().await);
    }
}
