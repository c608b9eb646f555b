//! Outbound notification collaborator
//!
//! Sends are fire-and-forget: a failed delivery is logged and never surfaced
//! to the request that triggered it.

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask a fresh account to activate itself.
    async fn send_activation(&self, email: &str, token: Uuid);

    /// Tell a deactivated account how to come back.
    async fn send_restoration(&self, email: &str, token: Uuid);
}

/// Mail-gateway webhook configuration
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Gateway endpoint receiving `{from, to, subject, body}` JSON
    pub webhook_url: String,
    /// Sender address stamped on every message
    pub sender: String,
}

impl NotifierConfig {
    /// Create a new NotifierConfig from environment variables
    ///
    /// # Environment Variables
    /// - `NOTIFY_WEBHOOK_URL`: mail gateway endpoint (default: local sink)
    /// - `NOTIFY_SENDER`: sender address (default: "no-reply@jotter.local")
    pub fn from_env() -> Self {
        let webhook_url = std::env::var("NOTIFY_WEBHOOK_URL")
            .unwrap_or_else(|_| "http://localhost:8025/api/send".to_string());
        let sender = std::env::var("NOTIFY_SENDER")
            .unwrap_or_else(|_| "no-reply@jotter.local".to_string());

        NotifierConfig {
            webhook_url,
            sender,
        }
    }
}

/// Notifier posting JSON messages to a mail gateway
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl WebhookNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn dispatch(&self, email: &str, subject: &str, body: String) {
        let client = self.client.clone();
        let url = self.config.webhook_url.clone();
        let payload = json!({
            "from": self.config.sender,
            "to": email,
            "subject": subject,
            "body": body,
        });

        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => error!("notification gateway returned {}", resp.status()),
                Err(e) => error!("failed to send notification: {}", e),
            }
        });
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_activation(&self, email: &str, token: Uuid) {
        info!("Queueing activation message for {}", email);
        self.dispatch(
            email,
            "Activate your account",
            format!("Use this identifier to activate your account: {token}"),
        );
    }

    async fn send_restoration(&self, email: &str, token: Uuid) {
        info!("Queueing restoration message for {}", email);
        self.dispatch(
            email,
            "Your account was deactivated",
            format!("Use this identifier to restore your account: {token}"),
        );
    }
}
