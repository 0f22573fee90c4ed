use axum::{extract::Request, middleware::Next, response::Response};

use crate::authz::CallerContext;

/// Attach a [`CallerContext`] built from the edge-injected identity headers.
///
/// Requests without a usable `X-User-UUID` pass through without a context;
/// the permission middleware decides whether that is acceptable.
pub async fn trusted_identity_middleware(mut req: Request, next: Next) -> Response {
    if let Some(caller) = CallerContext::from_headers(req.headers()) {
        tracing::debug!(user_id = %caller.user_id, roles = ?caller.roles, "Caller identity attached");
        req.extensions_mut().insert(caller);
    }

    next.run(req).await
}
