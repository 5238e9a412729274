//! Notification channels for the activation link.
//!
//! Each channel delivers one [`Notification`]. The [`NotificationDispatcher`]
//! runs them as ordered fallback routes and reports a per-channel outcome.

pub mod dispatcher;
pub mod email;
pub mod templates;
pub mod twilio;

pub use dispatcher::{DeliveryRoute, NotificationDispatcher};
pub use email::EmailChannel;
pub use twilio::{SmsChannel, TwilioClient, WhatsAppChannel};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ChannelError;
use crate::onboarding::OnboardingRecord;

/// Delivery channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[serde(rename = "whatsapp")]
    WhatsApp,
    Sms,
    Email,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WhatsApp => write!(f, "whatsapp"),
            Self::Sms => write!(f, "sms"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// What gets sent, independent of the channel.
#[derive(Debug, Clone)]
pub struct Notification {
    pub owner_name: String,
    pub business_name: String,
    /// E.164 phone of the recipient.
    pub phone: String,
    pub email: String,
    /// Activation link embedding the onboarding token.
    pub link: String,
}

impl Notification {
    pub fn for_record(record: &OnboardingRecord) -> Self {
        let submission = &record.payload.submission;
        Self {
            owner_name: submission.owner_name.clone(),
            business_name: submission.name.clone(),
            phone: submission.owner_phone.clone(),
            email: submission.owner_email.clone(),
            link: record.integrate_link().to_string(),
        }
    }
}

/// Provider acknowledgement of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// Provider-side id (Twilio message SID, SMTP response text).
    pub reference: String,
}

/// A single outbound delivery mechanism.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn deliver(&self, notification: &Notification) -> Result<Receipt, ChannelError>;
}

/// Result of one channel within a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered { reference: String },
    Failed { reason: String },
    /// Not attempted because an earlier channel in the route succeeded.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOutcome {
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// Per-channel outcomes of a dispatch, in route order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn status_of(&self, channel: ChannelKind) -> Option<&DeliveryStatus> {
        self.outcomes
            .iter()
            .find(|o| o.channel == channel)
            .map(|o| &o.status)
    }

    pub fn delivered(&self) -> Vec<ChannelKind> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Delivered { .. }))
            .map(|o| o.channel)
            .collect()
    }

    pub fn any_delivered(&self) -> bool {
        !self.delivered().is_empty()
    }
}
