use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::UserCreated;

/// Outbound channel for account lifecycle events.
#[async_trait]
pub trait UserEventPublisher: Send + Sync {
    async fn publish_user_created(&self, event: &UserCreated) -> Result<(), anyhow::Error>;
}

/// Writes events to the structured log. Used when no broker is wired in.
#[derive(Debug, Default, Clone)]
pub struct LogEventPublisher;

#[async_trait]
impl UserEventPublisher for LogEventPublisher {
    async fn publish_user_created(&self, event: &UserCreated) -> Result<(), anyhow::Error> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            payload = %payload,
            "UserCreated"
        );
        Ok(())
    }
}

/// Records published events; can be told to fail.
#[derive(Default)]
pub struct MockEventPublisher {
    events: Mutex<Vec<UserCreated>>,
    failure: Mutex<Option<String>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: &str) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(message.to_string());
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = None;
        }
    }

    pub fn events(&self) -> Vec<UserCreated> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserEventPublisher for MockEventPublisher {
    async fn publish_user_created(&self, event: &UserCreated) -> Result<(), anyhow::Error> {
        if let Some(message) = self
            .failure
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock publisher mutex poisoned: {}", e))?
            .clone()
        {
            return Err(anyhow::anyhow!(message));
        }

        self.events
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock publisher mutex poisoned: {}", e))?
            .push(event.clone());
        Ok(())
    }
}
