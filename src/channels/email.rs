//! Activation email over SMTP via lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use super::templates::{activation_html, activation_subject};
use super::{ChannelKind, DeliveryChannel, Notification, Receipt};
use crate::config::SmtpConfig;
use crate::error::ChannelError;

/// Port on which SMTP uses implicit TLS instead of STARTTLS.
const SMTPS_PORT: u16 = 465;

fn send_failed(reason: String) -> ChannelError {
    ChannelError::SendFailed {
        name: "email".into(),
        reason,
    }
}

/// Sends the activation email. Without SMTP config every send fails with
/// `NotConfigured`.
pub struct EmailChannel {
    config: Option<SmtpConfig>,
    /// Bounds connect, greeting and every SMTP command.
    timeout: Duration,
}

impl EmailChannel {
    pub fn new(config: Option<SmtpConfig>, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

/// Build the activation email for `notification`.
pub fn build_message(config: &SmtpConfig, notification: &Notification) -> Result<Message, ChannelError> {
    let from = Mailbox::new(
        Some(config.from_name.clone()),
        config
            .username
            .parse()
            .map_err(|e| send_failed(format!("Invalid from address: {e}")))?,
    );
    let to: Mailbox = notification.email.parse().map_err(|e| ChannelError::InvalidRecipient {
        name: "email".into(),
        reason: format!("{e}"),
    })?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(activation_subject(notification))
        .header(ContentType::TEXT_HTML)
        .body(activation_html(notification))
        .map_err(|e| send_failed(format!("Failed to build email: {e}")))
}

/// Blocking SMTP send. Run on the blocking pool.
fn send_blocking(
    config: &SmtpConfig,
    email: &Message,
    timeout: Duration,
) -> Result<String, ChannelError> {
    let creds = Credentials::new(
        config.username.clone(),
        config.password.expose_secret().to_string(),
    );

    let builder = if config.port == SMTPS_PORT {
        SmtpTransport::relay(&config.host)
    } else {
        SmtpTransport::starttls_relay(&config.host)
    }
    .map_err(|e| send_failed(format!("SMTP relay error: {e}")))?;

    let transport = builder
        .port(config.port)
        .credentials(creds)
        .timeout(Some(timeout))
        .build();

    let response = transport
        .send(email)
        .map_err(|e| send_failed(format!("SMTP send failed: {e}")))?;

    Ok(format!(
        "{} {}",
        response.code(),
        response.message().collect::<Vec<_>>().join(" ")
    ))
}

#[async_trait]
impl DeliveryChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, notification: &Notification) -> Result<Receipt, ChannelError> {
        let config = self
            .config
            .clone()
            .ok_or_else(|| ChannelError::NotConfigured {
                name: "email".into(),
            })?;
        let email = build_message(&config, notification)?;
        let timeout = self.timeout;

        let reference = tokio::task::spawn_blocking(move || send_blocking(&config, &email, timeout))
            .await
            .map_err(|e| send_failed(format!("SMTP task panicked: {e}")))??;

        Ok(Receipt { reference })
    }
}
