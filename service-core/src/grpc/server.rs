//! Side listener for `grpc.health.v1.Health`, separate from the HTTP port.

use std::net::SocketAddr;
use std::time::Duration;

use tonic::transport::Server;

use super::health::{HealthReporter, create_health_service};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GrpcServerBuilder {
    service_name: String,
}

impl GrpcServerBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn build_server(&self) -> Server {
        Server::builder()
            .http2_keepalive_interval(Some(KEEPALIVE_INTERVAL))
            .http2_keepalive_timeout(Some(KEEPALIVE_TIMEOUT))
    }

    /// Serve `grpc.health.v1.Health` on `port` in a background task.
    ///
    /// The returned reporter flips the status to `NOT_SERVING` on shutdown.
    pub async fn spawn_health_server(
        &self,
        port: u16,
    ) -> (tokio::task::JoinHandle<()>, HealthReporter) {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let health = create_health_service(self.service_name.clone()).await;
        let router = self.build_server().add_service(health.server);

        tracing::info!(port = port, service = %self.service_name, "Starting gRPC health server");

        let handle = tokio::spawn(async move {
            if let Err(e) = router.serve(addr).await {
                tracing::error!(error = %e, "gRPC health server error");
            }
        });

        (handle, health.reporter)
    }
}
