//! Key/value cache abstraction backing the session store and the role
//! enrichment cache.

pub mod memory;
pub mod redis;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

pub use memory::InMemoryCache;
pub use self::redis::RedisCache;

#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Write every field of a hash and its expiry as one atomic unit.
    async fn hash_set_with_ttl(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), anyhow::Error>;

    /// Read a whole hash. A missing key yields an empty map.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, anyhow::Error>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration)
    -> Result<(), anyhow::Error>;

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), anyhow::Error>;

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}
