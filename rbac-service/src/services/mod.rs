pub mod enriched_role;
pub mod error;
pub mod permission;
pub mod role;
pub mod user_events;
pub mod user_role;

pub use enriched_role::EnrichedRoleCache;
pub use error::ServiceError;
pub use permission::PermissionService;
pub use role::RoleService;
pub use user_events::UserEventHandler;
pub use user_role::UserRoleService;
