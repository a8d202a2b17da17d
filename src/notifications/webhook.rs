use async_trait::async_trait;
use reqwest::{Client, header};
use std::collections::HashMap;
use tera::{Context, Tera};

use super::{Notifier, NotifyError};

/// Posts a rendered JSON body to a configured webhook (mail relay, chat bot).
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

/// Renders a JSON body. Every value is substituted as a JSON string literal,
/// quotes included, so placeholders are written bare:
/// `{"host": {{ hostname }}}`.
pub fn render_body(template: &str, context: &HashMap<String, String>) -> Result<String, NotifyError> {
    let mut tera_context = Context::new();
    for (key, value) in context {
        let literal = serde_json::to_string(value)
            .map_err(|e| NotifyError::TemplatingError(e.to_string()))?;
        tera_context.insert(key, &literal);
    }
    let body = Tera::one_off(template, &tera_context, false)
        .map_err(|e| NotifyError::TemplatingError(e.to_string()))?;
    serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
        NotifyError::TemplatingError(format!("Rendered body is not valid JSON: {e}"))
    })?;
    Ok(body)
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(
        &self,
        template: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), NotifyError> {
        let body = render_body(template, context)?;

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(NotifyError::SendFailed(format!(
                "Webhook returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
