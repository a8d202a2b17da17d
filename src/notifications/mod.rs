use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub mod webhook;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Templating error: {0}")]
    TemplatingError(String),
}

/// Delivers customer-facing notifications (e.g. "your VPS is ready").
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a notification.
    ///
    /// * `template` - Tera template of the message body.
    /// * `context` - Values available to the template (e.g. "hostname": "web-1").
    async fn send(
        &self,
        template: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), NotifyError>;
}
