use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::authz::CallerContext;
use crate::error::AppError;
use crate::grpc::permission::PermissionPolicy;

/// Enforce the service's method table on every request.
///
/// The request path is the fully-qualified RPC method. Decisions are made as
/// gRPC statuses and rendered through `AppError`.
pub async fn permission_middleware(
    State(policy): State<Arc<PermissionPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = req.extensions().get::<CallerContext>();
    policy.authorize(req.uri().path(), caller)?;

    Ok(next.run(req).await)
}
