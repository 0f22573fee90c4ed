//! Read-through cache of roles joined with their permissions.
//!
//! Entries expire after a fixed TTL and are never invalidated on writes, so
//! a role mutation becomes visible to readers within one TTL.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use metrics::counter;
use service_core::cache::CacheClient;
use tracing::instrument;
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::{EnrichedRole, RoleRef};
use crate::repository::PermissionGraph;

const ENRICHED_ROLE_KEY_PREFIX: &str = "enriched_role:";

/// Upper bound on concurrent enrichments for one multi-role read.
pub const MAX_CONCURRENT_ENRICHMENTS: usize = 10;

#[derive(Clone)]
pub struct EnrichedRoleCache {
    cache: Arc<dyn CacheClient>,
    graph: Arc<dyn PermissionGraph>,
    ttl: Duration,
}

impl EnrichedRoleCache {
    pub fn new(cache: Arc<dyn CacheClient>, graph: Arc<dyn PermissionGraph>, ttl: Duration) -> Self {
        Self { cache, graph, ttl }
    }

    pub fn cache_key(role_id: &Uuid) -> String {
        format!("{}{}", ENRICHED_ROLE_KEY_PREFIX, role_id)
    }

    /// Names are resolved to an id through the graph before the cache is consulted.
    pub async fn get(&self, role: &RoleRef) -> Result<EnrichedRole, ServiceError> {
        let id = match role {
            RoleRef::Id(id) => *id,
            RoleRef::Name(_) => {
                self.graph
                    .find_role(role)
                    .await?
                    .ok_or(ServiceError::RoleNotFound)?
                    .id
            }
        };
        self.get_by_id(id).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, role_id: Uuid) -> Result<EnrichedRole, ServiceError> {
        let key = Self::cache_key(&role_id);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<EnrichedRole>(&raw) {
                Ok(enriched) => {
                    counter!("enriched_role_cache_total", "result" => "hit").increment(1);
                    return Ok(enriched);
                }
                Err(e) => tracing::warn!(error = %e, "Discarding undecodable cached role"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Role cache read failed, falling back to store"),
        }
        counter!("enriched_role_cache_total", "result" => "miss").increment(1);

        let role = self
            .graph
            .find_role(&RoleRef::Id(role_id))
            .await?
            .ok_or(ServiceError::RoleNotFound)?;
        let permissions = self.graph.role_permissions(role_id).await?;
        let enriched = EnrichedRole { role, permissions };

        match serde_json::to_string(&enriched) {
            Ok(raw) => {
                if let Err(e) = self.cache.set_with_ttl(&key, &raw, self.ttl).await {
                    tracing::warn!(error = %e, "Failed to cache enriched role");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode enriched role"),
        }

        Ok(enriched)
    }

    /// Enrich every id, preserving order. The first failure fails the whole read.
    pub async fn get_many(&self, role_ids: Vec<Uuid>) -> Result<Vec<EnrichedRole>, ServiceError> {
        stream::iter(role_ids)
            .map(|id| self.get_by_id(id))
            .buffered(MAX_CONCURRENT_ENRICHMENTS)
            .try_collect()
            .await
    }
}
