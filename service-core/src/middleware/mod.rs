pub mod identity;
pub mod metrics;
pub mod permission;
pub mod rate_limit;
pub mod recovery;
pub mod security_headers;
pub mod tracing;
