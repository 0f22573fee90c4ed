//! Session store: opaque session id -> frozen session + user profile, held in
//! the cache as one hash per session with a cache-level expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use service_core::cache::CacheClient;
use tracing::instrument;
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::{NotificationMethod, Session, UserProfile};

const SESSION_KEY_PREFIX: &str = "session:";

const F_SESSION_ID: &str = "session_id";
const F_SESSION_EXPIRES_AT: &str = "session_expires_at";
const F_SESSION_CREATED_AT: &str = "session_created_at";
const F_SESSION_UPDATED_AT: &str = "session_updated_at";
const F_USER_ID: &str = "user_id";
const F_USER_LOGIN: &str = "user_login";
const F_USER_EMAIL: &str = "user_email";
const F_USER_CREATED_AT: &str = "user_created_at";
const F_USER_UPDATED_AT: &str = "user_updated_at";
const F_NOTIFICATION_METHODS: &str = "notification_methods";
const F_ROLES: &str = "roles";

#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn CacheClient>,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self { cache }
    }

    pub fn cache_key(session_id: &Uuid) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, session_id)
    }

    /// Store a new session for `user` that lives until `expires_at`.
    ///
    /// The id is a fresh random UUID, unrelated to the user id.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &UserProfile,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, ServiceError> {
        let now = Utc::now();
        let ttl = (expires_at - now)
            .to_std()
            .ok()
            .filter(|ttl| !ttl.is_zero())
            .ok_or_else(|| {
                ServiceError::InvalidSession("Session expiry must be in the future".to_string())
            })?;

        let session = Session {
            id: Uuid::new_v4(),
            expires_at,
            created_at: now,
            updated_at: now,
        };
        let fields = encode_entry(&session, user)?;

        self.cache
            .hash_set_with_ttl(&Self::cache_key(&session.id), &fields, ttl)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store session");
                ServiceError::Cache(e)
            })?;

        tracing::info!(session_id = %session.id, ttl_secs = ttl.as_secs(), "Session created");
        Ok(session.id)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, session_id: Uuid) -> Result<(Session, UserProfile), ServiceError> {
        let entry = self
            .cache
            .hash_get_all(&Self::cache_key(&session_id))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to read session");
                ServiceError::Cache(e)
            })?;

        if entry.is_empty() {
            return Err(ServiceError::SessionNotFound);
        }

        decode_entry(&entry).map_err(|e| {
            tracing::warn!(error = %e, "Undecodable session entry");
            e
        })
    }

    /// Remove the session. Deleting an unknown session succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, session_id: Uuid) -> Result<(), ServiceError> {
        self.cache
            .delete(&Self::cache_key(&session_id))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete session");
                ServiceError::Cache(e)
            })?;
        tracing::info!("Session deleted");
        Ok(())
    }
}

fn nanos(field: &str, at: DateTime<Utc>) -> Result<String, ServiceError> {
    at.timestamp_nanos_opt()
        .map(|ns| ns.to_string())
        .ok_or_else(|| ServiceError::InvalidSession(format!("{} out of range", field)))
}

fn encode_entry(
    session: &Session,
    user: &UserProfile,
) -> Result<Vec<(String, String)>, ServiceError> {
    let notification_methods = serde_json::to_string(&user.notification_methods)
        .map_err(|e| ServiceError::Internal(e.into()))?;

    let mut fields = vec![
        (F_SESSION_ID.to_string(), session.id.to_string()),
        (
            F_SESSION_EXPIRES_AT.to_string(),
            nanos(F_SESSION_EXPIRES_AT, session.expires_at)?,
        ),
        (
            F_SESSION_CREATED_AT.to_string(),
            nanos(F_SESSION_CREATED_AT, session.created_at)?,
        ),
        (
            F_SESSION_UPDATED_AT.to_string(),
            nanos(F_SESSION_UPDATED_AT, session.updated_at)?,
        ),
        (F_USER_ID.to_string(), user.id.to_string()),
        (F_USER_LOGIN.to_string(), user.login.clone()),
        (F_USER_EMAIL.to_string(), user.email.clone()),
        (
            F_USER_CREATED_AT.to_string(),
            nanos(F_USER_CREATED_AT, user.created_at)?,
        ),
        (F_NOTIFICATION_METHODS.to_string(), notification_methods),
        (F_ROLES.to_string(), "[]".to_string()),
    ];

    if let Some(updated_at) = user.updated_at {
        fields.push((
            F_USER_UPDATED_AT.to_string(),
            nanos(F_USER_UPDATED_AT, updated_at)?,
        ));
    }

    Ok(fields)
}

fn required<'a>(entry: &'a HashMap<String, String>, field: &str) -> Result<&'a str, ServiceError> {
    entry
        .get(field)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::InvalidSessionData(format!("missing {}", field)))
}

fn parse_uuid(entry: &HashMap<String, String>, field: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(required(entry, field)?)
        .map_err(|e| ServiceError::InvalidSessionData(format!("{}: {}", field, e)))
}

fn parse_nanos(raw: &str, field: &str) -> Result<DateTime<Utc>, ServiceError> {
    raw.parse::<i64>()
        .map(|ns| Utc.timestamp_nanos(ns))
        .map_err(|e| ServiceError::InvalidSessionData(format!("{}: {}", field, e)))
}

fn parse_time(entry: &HashMap<String, String>, field: &str) -> Result<DateTime<Utc>, ServiceError> {
    parse_nanos(required(entry, field)?, field)
}

/// Absent, empty and zero all mean "never set".
fn parse_optional_time(
    entry: &HashMap<String, String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ServiceError> {
    match entry.get(field).map(String::as_str) {
        None | Some("") | Some("0") => Ok(None),
        Some(raw) => parse_nanos(raw, field).map(Some),
    }
}

fn decode_entry(entry: &HashMap<String, String>) -> Result<(Session, UserProfile), ServiceError> {
    let session = Session {
        id: parse_uuid(entry, F_SESSION_ID)?,
        expires_at: parse_time(entry, F_SESSION_EXPIRES_AT)?,
        created_at: parse_time(entry, F_SESSION_CREATED_AT)?,
        updated_at: parse_time(entry, F_SESSION_UPDATED_AT)?,
    };

    let notification_methods: Vec<NotificationMethod> = match entry
        .get(F_NOTIFICATION_METHODS)
        .map(String::as_str)
    {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            ServiceError::InvalidSessionData(format!("{}: {}", F_NOTIFICATION_METHODS, e))
        })?,
    };

    let user = UserProfile {
        id: parse_uuid(entry, F_USER_ID)?,
        login: required(entry, F_USER_LOGIN)?.to_string(),
        email: entry.get(F_USER_EMAIL).cloned().unwrap_or_default(),
        notification_methods,
        created_at: parse_time(entry, F_USER_CREATED_AT)?,
        updated_at: parse_optional_time(entry, F_USER_UPDATED_AT)?,
    };

    Ok((session, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use service_core::cache::InMemoryCache;
    use std::time::Duration;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            login: "alice".to_string(),
            email: "alice@example.com".to_string(),
            notification_methods: vec![NotificationMethod {
                provider_name: "telegram".to_string(),
                target: "@alice".to_string(),
            }],
            created_at: Utc.timestamp_nanos(1_700_000_000_123_456_789),
            updated_at: None,
        }
    }

    #[test]
    fn test_entry_codec_preserves_profile() {
        let user = profile();
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            expires_at: now + ChronoDuration::hours(1),
            created_at: now,
            updated_at: now,
        };

        let fields: HashMap<String, String> =
            encode_entry(&session, &user).unwrap().into_iter().collect();
        assert!(!fields.contains_key(F_USER_UPDATED_AT));
        assert_eq!(fields.get(F_ROLES).map(String::as_str), Some("[]"));

        let (decoded_session, decoded_user) = decode_entry(&fields).unwrap();
        assert_eq!(decoded_session, session);
        assert_eq!(decoded_user, user);
    }

    #[test]
    fn test_zero_updated_at_means_none() {
        let user = profile();
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            expires_at: now,
            created_at: now,
            updated_at: now,
        };
        let mut fields: HashMap<String, String> =
            encode_entry(&session, &user).unwrap().into_iter().collect();
        fields.insert(F_USER_UPDATED_AT.to_string(), "0".to_string());

        let (_, decoded) = decode_entry(&fields).unwrap();
        assert_eq!(decoded.updated_at, None);
    }

    #[test]
    fn test_garbage_entry_is_invalid_session_data() {
        let mut fields = HashMap::new();
        fields.insert(F_SESSION_ID.to_string(), "not-a-uuid".to_string());

        assert!(matches!(
            decode_entry(&fields),
            Err(ServiceError::InvalidSessionData(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_past_expiry() {
        let store = SessionStore::new(Arc::new(InMemoryCache::new()));
        let result = store
            .create(&profile(), Utc::now() - ChronoDuration::seconds(1))
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidSession(_))));
    }

    #[tokio::test]
    async fn test_undecodable_cached_entry() {
        let cache = Arc::new(InMemoryCache::new());
        let session_id = Uuid::new_v4();
        cache
            .hash_set_with_ttl(
                &SessionStore::cache_key(&session_id),
                &[(F_SESSION_ID.to_string(), session_id.to_string())],
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let store = SessionStore::new(cache);
        assert!(matches!(
            store.get(session_id).await,
            Err(ServiceError::InvalidSessionData(_))
        ));
    }
}
