use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::CheckRequestBody;
use crate::services::{CheckDecision, CheckRequest, HeaderEntry};
use crate::AppState;

const ENVOY_HEADERS_TO_REMOVE: &str = "x-envoy-auth-headers-to-remove";

fn apply_headers(target: &mut HeaderMap, entries: &[HeaderEntry]) {
    for entry in entries {
        match (
            HeaderName::from_bytes(entry.key.as_bytes()),
            HeaderValue::from_str(&entry.value),
        ) {
            (Ok(name), Ok(value)) => {
                target.insert(name, value);
            }
            _ => tracing::warn!(header = %entry.key, "Dropping header with unrepresentable value"),
        }
    }
}

/// Envoy HTTP-mode external authorization: any method on `/ext_authz` and below.
///
/// A 200 tells the proxy to forward the original request with the returned
/// identity headers; anything else is sent back to the client as-is.
pub async fn http_check(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request = CheckRequest::from_header_map(&headers);

    match state.ext_authz.check(&request).await {
        CheckDecision::Allow {
            headers_to_add,
            headers_to_remove,
        } => {
            let mut response = StatusCode::OK.into_response();
            apply_headers(response.headers_mut(), &headers_to_add);
            if let Ok(value) = HeaderValue::from_str(&headers_to_remove.join(",")) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(ENVOY_HEADERS_TO_REMOVE), value);
            }
            response
        }
        CheckDecision::Denied {
            http_status,
            body,
            headers,
        } => {
            let status = StatusCode::from_u16(http_status).unwrap_or(StatusCode::UNAUTHORIZED);
            let mut response = (status, body).into_response();
            apply_headers(response.headers_mut(), &headers);
            response
        }
    }
}

/// `POST /envoy.service.auth.v3.Authorization/Check`
pub async fn json_check(
    State(state): State<AppState>,
    Json(body): Json<CheckRequestBody>,
) -> Json<CheckDecision> {
    let request = CheckRequest::new(body.into_headers());
    Json(state.ext_authz.check(&request).await)
}
