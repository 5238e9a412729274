//! Twilio Messages API: WhatsApp and SMS delivery.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::templates::activation_text;
use super::{ChannelKind, DeliveryChannel, Notification, Receipt};
use crate::config::TwilioConfig;
use crate::error::ChannelError;

const WHATSAPP_PREFIX: &str = "whatsapp:";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Thin client over `POST /2010-04-01/Accounts/{sid}/Messages.json`.
///
/// Built even when Twilio is not configured, so the channels can report
/// `NotConfigured` at send time.
pub struct TwilioClient {
    http: reqwest::Client,
    config: Option<TwilioConfig>,
}

impl TwilioClient {
    pub fn new(http: reqwest::Client, config: Option<TwilioConfig>) -> Arc<Self> {
        Arc::new(Self { http, config })
    }

    fn messages_url(config: &TwilioConfig) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_url.trim_end_matches('/'),
            config.account_sid
        )
    }

    /// Send one message. Returns the Twilio message SID.
    pub async fn send(
        &self,
        channel: ChannelKind,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, ChannelError> {
        let name = channel.to_string();
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured { name: name.clone() })?;

        let resp = self
            .http
            .post(Self::messages_url(config))
            .basic_auth(&config.account_sid, Some(config.auth_token.expose_secret()))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) => format!(
                    "HTTP {status}: {} (code {})",
                    err.message,
                    err.code.map(|c| c.to_string()).unwrap_or_else(|| "?".into())
                ),
                Err(_) => format!("HTTP {status}: {text}"),
            };
            return Err(ChannelError::SendFailed { name, reason });
        }

        let message: MessageResponse =
            resp.json().await.map_err(|e| ChannelError::SendFailed {
                name: name.clone(),
                reason: format!("Unreadable Twilio response: {e}"),
            })?;

        tracing::debug!(channel = %name, sid = %message.sid, "Twilio message accepted");
        Ok(message.sid)
    }

    fn config(&self) -> Option<&TwilioConfig> {
        self.config.as_ref()
    }
}

/// `whatsapp:+55…` form required by Twilio for WhatsApp addresses.
pub fn whatsapp_address(phone: &str) -> String {
    if phone.starts_with(WHATSAPP_PREFIX) {
        phone.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{phone}")
    }
}

/// Plain phone for SMS, with any `whatsapp:` prefix removed.
pub fn sms_address(phone: &str) -> String {
    phone.replace(WHATSAPP_PREFIX, "")
}

/// WhatsApp delivery through the Twilio WhatsApp sender.
pub struct WhatsAppChannel {
    client: Arc<TwilioClient>,
}

impl WhatsAppChannel {
    pub fn new(client: Arc<TwilioClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn deliver(&self, notification: &Notification) -> Result<Receipt, ChannelError> {
        let sender = self
            .client
            .config()
            .and_then(|c| c.whatsapp_sender.as_deref())
            .ok_or_else(|| ChannelError::NotConfigured {
                name: self.kind().to_string(),
            })?;

        let reference = self
            .client
            .send(
                self.kind(),
                &whatsapp_address(sender),
                &whatsapp_address(&notification.phone),
                &activation_text(notification),
            )
            .await?;
        Ok(Receipt { reference })
    }
}

/// SMS delivery through the Twilio SMS sender.
pub struct SmsChannel {
    client: Arc<TwilioClient>,
}

impl SmsChannel {
    pub fn new(client: Arc<TwilioClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(&self, notification: &Notification) -> Result<Receipt, ChannelError> {
        let sender = self
            .client
            .config()
            .and_then(|c| c.sms_sender.as_deref())
            .ok_or_else(|| ChannelError::NotConfigured {
                name: self.kind().to_string(),
            })?;

        let reference = self
            .client
            .send(
                self.kind(),
                sender,
                &sms_address(&notification.phone),
                &activation_text(notification),
            )
            .await?;
        Ok(Receipt { reference })
    }
}
