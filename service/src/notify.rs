//! Outbound engine event delivery.
//!
//! Engine events (coins earned, rank ups, unlocks) are forwarded to an
//! optional webhook so sibling services can react to them. Delivery is
//! fire-and-forget: a failed delivery is logged and never fails the
//! request that produced the event.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ml_rewards_core::UserId;
use serde::Serialize;

/// An event emitted by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    /// Event kind, e.g. `coins_earned` or `rank_up`.
    pub kind: &'static str,
    /// Learner the event concerns.
    pub user_id: UserId,
    /// Event-specific payload.
    pub payload: serde_json::Value,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl OutboundEvent {
    /// Build an event stamped with the current time.
    #[must_use]
    pub fn new(kind: &'static str, user_id: UserId, payload: serde_json::Value) -> Self {
        Self {
            kind,
            user_id,
            payload,
            occurred_at: Utc::now(),
        }
    }
}

/// Sink for outbound engine events.
#[async_trait]
pub trait Notify: Send + Sync {
    /// Deliver a single event.
    async fn deliver(&self, event: OutboundEvent) -> Result<(), String>;
}

/// Delivers events to a webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`.
    #[must_use]
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }
}

#[async_trait]
impl Notify for WebhookNotifier {
    async fn deliver(&self, event: OutboundEvent) -> Result<(), String> {
        let mut request = self.client.post(&self.url).json(&event);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("webhook returned {}", response.status()));
        }
        Ok(())
    }
}

/// Logs events instead of delivering them. Used when no webhook is
/// configured.
pub struct LogNotifier;

#[async_trait]
impl Notify for LogNotifier {
    async fn deliver(&self, event: OutboundEvent) -> Result<(), String> {
        tracing::info!(
            kind = event.kind,
            user_id = %event.user_id,
            "Engine event (no webhook configured)"
        );
        Ok(())
    }
}

/// Spawn a delivery task for `event`. Failures are logged, never
/// propagated.
pub fn send(notifier: &Arc<dyn Notify>, event: OutboundEvent) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        let kind = event.kind;
        let user_id = event.user_id;
        if let Err(e) = notifier.deliver(event).await {
            tracing::warn!(
                kind,
                user_id = %user_id,
                error = %e,
                "Failed to deliver engine event"
            );
        }
    });
}
