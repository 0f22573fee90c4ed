//! Shared authorization vocabulary: RBAC types, trust headers and the
//! per-call caller context.

pub mod context;
pub mod headers;
pub mod model;

pub use context::CallerContext;
pub use model::{Permission, Role, RoleWithPermissions};
