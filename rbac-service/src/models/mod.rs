pub mod events;
pub mod permission;
pub mod role;
pub mod user_role;

pub use events::UserCreated;
pub use permission::{PermissionFilter, PermissionRef};
pub use role::{CreateRole, RoleFilter, RoleRef, UpdateRole};
pub use user_role::{PageRequest, RoleUsersPage};

/// A role together with its permissions, as cached and returned by `GetRole`.
pub type EnrichedRole = service_core::authz::RoleWithPermissions;
