pub mod accounts;
pub mod auth;
pub mod error;
pub mod events;
pub mod ext_authz;
pub mod rbac_client;
pub mod session;
pub mod users;
pub mod whoami;

pub use accounts::UserService;
pub use auth::{AuthService, LoginOutcome};
pub use error::ServiceError;
pub use events::{LogEventPublisher, MockEventPublisher, UserEventPublisher};
pub use ext_authz::{CheckDecision, CheckRequest, ExtAuthzService, HeaderEntry};
pub use rbac_client::{MockRoleDirectory, RbacClient, RoleDirectory};
pub use session::SessionStore;
pub use users::{MockUserRepository, PgUserRepository, UserRepository};
pub use whoami::IdentityResolver;
