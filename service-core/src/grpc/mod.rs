//! gRPC utilities shared by the identity and RBAC services.
//!
//! - Error conversion between `AppError` and `tonic::Status`
//! - Static per-method permission enforcement
//! - Health check service and server builder

pub mod error;
pub mod health;
pub mod permission;
pub mod server;

pub use error::IntoStatus;
pub use health::{HealthComponents, HealthReporter, HealthStatus, create_health_service};
pub use permission::{MethodRule, PermissionPolicy, SYSTEM_METHODS};
pub use server::GrpcServerBuilder;

pub use tonic::{Code, Status};
