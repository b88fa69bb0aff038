//! Shared application state.

use std::sync::Arc;

use ml_rewards_store::RocksStore;

use crate::config::ServiceConfig;
use crate::notify::{LogNotifier, Notify, WebhookNotifier};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Persistent store.
    pub store: Arc<RocksStore>,
    /// Service configuration.
    pub config: ServiceConfig,
    /// Outbound event sink.
    pub notifier: Arc<dyn Notify>,
}

impl AppState {
    /// Create application state from configuration and an opened store.
    #[must_use]
    pub fn new(config: ServiceConfig, store: Arc<RocksStore>) -> Self {
        let notifier: Arc<dyn Notify> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(
                url.clone(),
                config.notify_webhook_key.clone(),
            )),
            None => {
                tracing::warn!("NOTIFY_WEBHOOK_URL not set, engine events will only be logged");
                Arc::new(LogNotifier)
            }
        };

        Self {
            store,
            config,
            notifier,
        }
    }
}
