//! service-core: shared infrastructure for the identity and RBAC services.
pub mod authz;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod grpc;
pub mod middleware;
pub mod observability;

pub use async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tonic;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
