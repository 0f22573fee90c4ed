use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::CacheClient;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache with per-key expiry.
///
/// Expiry follows the tokio clock, so paused-time tests can step past a TTL
/// with `tokio::time::advance`.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write operations so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    fn live(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        self.evict_expired(key);
        None
    }

    /// Expiry is re-checked under the shard lock so a concurrent rewrite survives.
    fn evict_expired(&self, key: &str) {
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
    }

    fn insert(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheClient for InMemoryCache {
    async fn hash_set_with_ttl(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), anyhow::Error> {
        if fields.is_empty() {
            return Err(anyhow::anyhow!("Refusing to write empty hash {}", key));
        }
        let mut hash = match self.live(key) {
            Some(Value::Hash(existing)) => existing,
            _ => HashMap::new(),
        };
        hash.extend(fields.iter().cloned());
        self.insert(key, Value::Hash(hash), ttl);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, anyhow::Error> {
        match self.live(key) {
            Some(Value::Hash(hash)) => Ok(hash),
            Some(Value::Str(_)) => Err(anyhow::anyhow!("WRONGTYPE key {} holds a string", key)),
            None => Ok(HashMap::new()),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), anyhow::Error> {
        self.insert(key, Value::Str(value.to_string()), ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        match self.live(key) {
            Some(Value::Str(value)) => Ok(Some(value)),
            Some(Value::Hash(_)) => Err(anyhow::anyhow!("WRONGTYPE key {} holds a hash", key)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        self.entries.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
