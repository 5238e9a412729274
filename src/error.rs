//! Error types for the onboarding service.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Onboarding store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record {token} cannot move from {from} to {to}")]
    InvalidTransition {
        token: String,
        from: String,
        to: String,
    },
}

/// Notification channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} is not configured")]
    NotConfigured { name: String },

    #[error("Invalid recipient for channel {name}: {reason}")]
    InvalidRecipient { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Errors from third-party HTTP integrations (Supabase, n8n, Facebook Graph).
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{service} is not configured")]
    NotConfigured { service: String },

    #[error("{service} request failed: {reason}")]
    RequestFailed { service: String, reason: String },

    #[error("{service} request timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("{service} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },
}

impl IntegrationError {
    /// Classify a reqwest error for `service`, separating timeouts.
    pub fn from_reqwest(service: &str, err: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) if err.is_timeout() => Self::Timeout {
                service: service.to_string(),
                timeout,
            },
            _ => Self::RequestFailed {
                service: service.to_string(),
                reason: err.to_string(),
            },
        }
    }
}
