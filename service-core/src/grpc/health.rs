//! `grpc.health.v1.Health` for container probes, backed by `tonic-health`.

use tonic_health::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::server::HealthReporter as TonicHealthReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Serving,
    NotServing,
    Unknown,
}

impl From<HealthStatus> for ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Serving => ServingStatus::Serving,
            HealthStatus::NotServing => ServingStatus::NotServing,
            HealthStatus::Unknown => ServingStatus::Unknown,
        }
    }
}

/// Updates the health status reported for one named service.
#[derive(Clone)]
pub struct HealthReporter {
    inner: TonicHealthReporter,
    service_name: String,
}

impl HealthReporter {
    pub async fn set_status(&self, status: HealthStatus) {
        let mut reporter = self.inner.clone();
        reporter
            .set_service_status(&self.service_name, status.into())
            .await;
        tracing::info!(service = %self.service_name, status = ?status, "Health status updated");
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }
}

pub struct HealthComponents<S> {
    pub server: HealthServer<S>,
    pub reporter: HealthReporter,
}

/// Create the health server with `service_name` initially `SERVING`.
pub async fn create_health_service(
    service_name: impl Into<String>,
) -> HealthComponents<impl Health> {
    let service_name = service_name.into();
    let (mut reporter, server) = tonic_health::server::health_reporter();

    reporter
        .set_service_status(&service_name, ServingStatus::Serving)
        .await;

    HealthComponents {
        server,
        reporter: HealthReporter {
            inner: reporter,
            service_name,
        },
    }
}
