//! Forwards accepted submissions to the n8n automation webhook.

use crate::config::{WebhookConfig, WebhookFailureMode};
use crate::error::IntegrationError;
use crate::onboarding::LeadPayload;

const SERVICE: &str = "n8n webhook";

pub struct WebhookForwarder {
    http: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookForwarder {
    pub fn new(http: reqwest::Client, config: WebhookConfig) -> Self {
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.url.is_some()
    }

    pub fn failure_mode(&self) -> WebhookFailureMode {
        self.config.failure_mode
    }

    /// POST the payload as JSON, bounded by the configured timeout.
    pub async fn forward(&self, payload: &LeadPayload) -> Result<(), IntegrationError> {
        let url = self
            .config
            .url
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured {
                service: SERVICE.into(),
            })?;

        let resp = self
            .http
            .post(url)
            .timeout(self.config.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e, Some(self.config.timeout)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IntegrationError::UnexpectedStatus {
                service: SERVICE.into(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(token = %payload.token, "Submission forwarded to n8n webhook");
        Ok(())
    }
}
