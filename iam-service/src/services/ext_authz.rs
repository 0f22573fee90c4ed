//! Edge authorization decisions for the proxy's external-authorization hook.
//!
//! Input is the set of request headers the proxy forwards. Output is either an
//! allow decision carrying the identity headers to inject, or a 401 denial.

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use chrono::{SecondsFormat, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use service_core::authz::headers::{
    join_permissions, join_role_names, AUTHORIZATION_HEADER, AUTH_STATUS_DENIED,
    AUTH_STATUS_HEADER, CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON, COOKIE_HEADER,
    SESSION_COOKIE_NAME, SESSION_ID_HEADER, USER_LOGIN_HEADER, USER_PERMISSIONS_HEADER,
    USER_ROLES_HEADER, USER_UUID_HEADER,
};
use tracing::instrument;
use uuid::Uuid;

use super::whoami::IdentityResolver;

const MISSING_SESSION: &str = "Missing or invalid session";
const INVALID_SESSION: &str = "Invalid session";

/// Request attributes as seen by the proxy. Header names are lower-cased.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    headers: HashMap<String, String>,
}

impl CheckRequest {
    pub fn new(headers: HashMap<String, String>) -> Self {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    /// Repeated `cookie` headers are folded into one value.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut map: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            match map.get_mut(name.as_str()) {
                Some(existing) if name.as_str() == COOKIE_HEADER => {
                    existing.push_str("; ");
                    existing.push_str(value);
                }
                Some(_) => {}
                None => {
                    map.insert(name.as_str().to_string(), value.to_string());
                }
            }
        }
        Self { headers: map }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// `sid` header first, then the session cookie.
    pub fn session_id(&self) -> Option<Uuid> {
        // An unparseable `sid` does not shadow a usable cookie.
        if let Some(Ok(id)) = self
            .header(SESSION_ID_HEADER)
            .map(|sid| Uuid::parse_str(sid.trim()))
        {
            return Some(id);
        }

        let raw = self.header(COOKIE_HEADER)?;
        let cookie = Cookie::split_parse(raw)
            .filter_map(Result::ok)
            .find(|c| c.name() == SESSION_COOKIE_NAME)?;

        let value = cookie.value();
        let decoded = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        Uuid::parse_str(decoded.trim()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckDecision {
    #[serde(rename = "ok")]
    Allow {
        headers_to_add: Vec<HeaderEntry>,
        headers_to_remove: Vec<String>,
    },
    Denied {
        http_status: u16,
        body: String,
        headers: Vec<HeaderEntry>,
    },
}

impl CheckDecision {
    fn deny(message: &str) -> Self {
        let body = json!({
            "error": message,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        });

        CheckDecision::Denied {
            http_status: 401,
            body: body.to_string(),
            headers: vec![
                HeaderEntry::new(CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON),
                HeaderEntry::new(AUTH_STATUS_HEADER, AUTH_STATUS_DENIED),
            ],
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, CheckDecision::Allow { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            CheckDecision::Allow { .. } => "allow",
            CheckDecision::Denied { .. } => "deny",
        }
    }
}

#[derive(Clone)]
pub struct ExtAuthzService {
    resolver: IdentityResolver,
}

impl ExtAuthzService {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self { resolver }
    }

    #[instrument(skip(self, request))]
    pub async fn check(&self, request: &CheckRequest) -> CheckDecision {
        let decision = self.decide(request).await;
        counter!("ext_authz_decisions_total", "decision" => decision.label()).increment(1);
        decision
    }

    async fn decide(&self, request: &CheckRequest) -> CheckDecision {
        let Some(session_id) = request.session_id() else {
            tracing::debug!("No usable session id on request");
            return CheckDecision::deny(MISSING_SESSION);
        };

        let identity = match self.resolver.resolve(session_id).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::info!(%session_id, error = %e, "Denying request");
                return CheckDecision::deny(INVALID_SESSION);
            }
        };

        let roles = &identity.roles_with_permissions;
        CheckDecision::Allow {
            headers_to_add: vec![
                HeaderEntry::new(USER_UUID_HEADER, identity.user.id.to_string()),
                HeaderEntry::new(USER_LOGIN_HEADER, identity.user.login.clone()),
                HeaderEntry::new(USER_ROLES_HEADER, join_role_names(roles)),
                HeaderEntry::new(USER_PERMISSIONS_HEADER, join_permissions(roles)),
            ],
            headers_to_remove: vec![COOKIE_HEADER.to_string(), AUTHORIZATION_HEADER.to_string()],
        }
    }
}
