// Idempotency Replay Cache
// `X-Idempotency-Key` is accepted on every mutation; a successful response is
// recorded under (method, route, key) and replayed verbatim on retry until
// the entry expires. Checked before the mutation runs, populated after.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub method: String,
    pub route: String,
    pub key: String,
}

impl IdempotencyKey {
    pub fn new(method: &str, route: &str, key: &str) -> Self {
        Self {
            method: method.to_string(),
            route: route.to_string(),
            key: key.to_string(),
        }
    }
}

/// A recorded response: status plus raw body bytes.
#[derive(Clone)]
pub struct StoredResponse {
    pub status: u16,
    pub body: Vec<u8>,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct IdempotencyCache {
    entries: Arc<RwLock<HashMap<IdempotencyKey, StoredResponse>>>,
    ttl: Duration,
    max_entries: usize,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_entries,
        }
    }

    pub fn enabled(&self) -> bool {
        self.max_entries > 0 && self.ttl > Duration::ZERO
    }

    /// Fetch a previously recorded response for this key, if still live.
    pub async fn lookup(&self, key: &IdempotencyKey) -> Option<StoredResponse> {
        if !self.enabled() {
            return None;
        }

        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .cloned()
    }

    /// Record a successful mutation response for later replay.
    pub async fn record(&self, key: IdempotencyKey, status: u16, body: Vec<u8>) {
        if !self.enabled() {
            return;
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;

        entries.retain(|_, entry| entry.expires_at > now);
        if entries.len() >= self.max_entries {
            // Full even after expiry sweep: drop the write rather than grow
            // unboundedly. The retry then behaves like an unkeyed one.
            return;
        }

        entries.insert(
            key,
            StoredResponse {
                status,
                body,
                expires_at: now + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_round_trip() {
        let cache = IdempotencyCache::new(Duration::from_secs(60), 16);
        let key = IdempotencyKey::new("POST", "/v1/projects", "client-key-1");

        assert!(cache.lookup(&key).await.is_none());
        cache.record(key.clone(), 201, b"{\"id\":\"x\"}".to_vec()).await;

        let stored = cache.lookup(&key).await.expect("entry is live");
        assert_eq!(stored.status, 201);
        assert_eq!(stored.body, b"{\"id\":\"x\"}");
    }

    #[tokio::test]
    async fn test_key_is_scoped_per_route_and_method() {
        let cache = IdempotencyCache::new(Duration::from_secs(60), 16);
        cache
            .record(
                IdempotencyKey::new("POST", "/v1/projects", "k"),
                201,
                vec![1],
            )
            .await;

        assert!(cache
            .lookup(&IdempotencyKey::new("POST", "/v1/documents", "k"))
            .await
            .is_none());
        assert!(cache
            .lookup(&IdempotencyKey::new("PATCH", "/v1/projects", "k"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_ignored() {
        let cache = IdempotencyCache::new(Duration::from_millis(5), 16);
        let key = IdempotencyKey::new("POST", "/v1/projects", "short-lived");
        cache.record(key.clone(), 201, vec![]).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.lookup(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_stores() {
        let cache = IdempotencyCache::new(Duration::ZERO, 16);
        let key = IdempotencyKey::new("POST", "/v1/projects", "k");
        cache.record(key.clone(), 201, vec![]).await;
        assert!(cache.lookup(&key).await.is_none());
    }
}
