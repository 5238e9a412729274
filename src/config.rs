//! Configuration types, built from environment variables.
//!
//! Every integration section is optional. A missing section is logged at
//! startup and only surfaces as an error when the integration is invoked.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// What to do when forwarding a submission to the automation webhook fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFailureMode {
    /// Log the failure and keep going (notify + 200).
    Ignore,
    /// Roll back the record and answer 500.
    Abort,
}

impl FromStr for WebhookFailureMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "abort" => Ok(Self::Abort),
            other => Err(format!("expected \"ignore\" or \"abort\", got \"{other}\"")),
        }
    }
}

/// Which set of form fields is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionVariant {
    /// Business and owner fields only.
    Basic,
    /// Business and owner fields plus the business-profile questionnaire.
    BusinessProfile,
}

impl FromStr for SubmissionVariant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "business_profile" | "business-profile" => Ok(Self::BusinessProfile),
            other => Err(format!(
                "expected \"basic\" or \"business_profile\", got \"{other}\""
            )),
        }
    }
}

/// Boolean environment switch. Accepts true/false, 1/0, yes/no and on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl FromStr for Flag {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            other => Err(format!("expected a boolean such as \"true\" or \"0\", got \"{other}\"")),
        }
    }
}

/// Automation webhook (n8n) settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub timeout: Duration,
    pub failure_mode: WebhookFailureMode,
}

/// SMTP settings for the activation email.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_name: String,
}

/// Twilio settings for WhatsApp and SMS delivery.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub whatsapp_sender: Option<String>,
    pub sms_sender: Option<String>,
    pub api_url: String,
}

/// Supabase REST settings for the agent directory.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
}

/// Facebook app settings for the WABA OAuth flow.
#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub app_id: String,
    pub app_secret: SecretString,
    pub redirect_uri: String,
    pub graph_version: String,
    /// Base URL of the OAuth dialog host.
    pub dialog_url: String,
    /// Base URL of the Graph API host.
    pub graph_url: String,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base of the activation links sent to submitters.
    pub public_base_url: String,
    pub submission_variant: SubmissionVariant,
    pub debug_routes: bool,
    pub webhook: WebhookConfig,
    pub smtp: Option<SmtpConfig>,
    pub twilio: Option<TwilioConfig>,
    pub supabase: Option<SupabaseConfig>,
    pub facebook: Option<FacebookConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            public_base_url: "http://localhost:3001".to_string(),
            submission_variant: SubmissionVariant::BusinessProfile,
            debug_routes: true,
            webhook: WebhookConfig {
                url: None,
                timeout: Duration::from_secs(10),
                failure_mode: WebhookFailureMode::Abort,
            },
            smtp: None,
            twilio: None,
            supabase: None,
            facebook: None,
        }
    }
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port: u16 = parse_var("PORT")?.unwrap_or(defaults.port);
        let public_base_url = var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let webhook = WebhookConfig {
            url: var("N8N_WEBHOOK_URL"),
            timeout: parse_var::<u64>("WEBHOOK_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.webhook.timeout),
            failure_mode: parse_var("WEBHOOK_FAILURE_MODE")?
                .unwrap_or(defaults.webhook.failure_mode),
        };

        Ok(Self {
            port,
            public_base_url,
            submission_variant: parse_var("SUBMISSION_VARIANT")?
                .unwrap_or(defaults.submission_variant),
            debug_routes: parse_var::<Flag>("ENABLE_DEBUG_ROUTES")?
                .map_or(defaults.debug_routes, |Flag(on)| on),
            webhook,
            smtp: smtp_from_env()?,
            twilio: twilio_from_env(),
            supabase: supabase_from_env(),
            facebook: facebook_from_env(),
        })
    }

    /// Log which integrations are configured. Missing ones are warnings, not errors.
    pub fn log_integrations(&self) {
        if self.webhook.url.is_none() {
            tracing::warn!("N8N_WEBHOOK_URL not set; submissions will be rejected with 500");
        }
        if self.smtp.is_none() {
            tracing::warn!("SMTP credentials not configured; activation emails will not be sent");
        }
        match &self.twilio {
            None => tracing::warn!(
                "Twilio credentials not configured; WhatsApp/SMS messages will not be sent"
            ),
            Some(twilio) => {
                if twilio.whatsapp_sender.is_none() {
                    tracing::warn!("TWILIO_WHATSAPP_SENDER not set; WhatsApp delivery disabled");
                }
                if twilio.sms_sender.is_none() {
                    tracing::warn!("TWILIO_SMS_SENDER not set; SMS fallback disabled");
                }
            }
        }
        if self.supabase.is_none() {
            tracing::warn!("Supabase credentials not configured; agent lookups will fail");
        }
        if self.facebook.is_none() {
            tracing::warn!("Facebook app not configured; /connect will answer 500");
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

fn smtp_from_env() -> Result<Option<SmtpConfig>, ConfigError> {
    let (Some(host), Some(username), Some(password)) =
        (var("SMTP_HOST"), var("SMTP_USER"), var("SMTP_PASS"))
    else {
        return Ok(None);
    };

    Ok(Some(SmtpConfig {
        host,
        port: parse_var("SMTP_PORT")?.unwrap_or(587),
        username,
        password: SecretString::from(password),
        from_name: var("SMTP_FROM_NAME").unwrap_or_else(|| "Global Call Partners".to_string()),
    }))
}

fn twilio_from_env() -> Option<TwilioConfig> {
    let account_sid = var("TWILIO_ACCOUNT_SID")?;
    let auth_token = var("TWILIO_AUTH_TOKEN")?;

    Some(TwilioConfig {
        account_sid,
        auth_token: SecretString::from(auth_token),
        whatsapp_sender: var("TWILIO_WHATSAPP_SENDER"),
        sms_sender: var("TWILIO_SMS_SENDER"),
        api_url: var("TWILIO_API_URL").unwrap_or_else(|| "https://api.twilio.com".to_string()),
    })
}

fn supabase_from_env() -> Option<SupabaseConfig> {
    let url = var("SUPABASE_URL")?;
    let anon_key = var("SUPABASE_ANON_KEY")?;

    Some(SupabaseConfig {
        url: url.trim_end_matches('/').to_string(),
        anon_key: SecretString::from(anon_key),
    })
}

fn facebook_from_env() -> Option<FacebookConfig> {
    let app_id = var("FACEBOOK_APP_ID")?;
    let app_secret = var("FACEBOOK_APP_SECRET")?;
    let redirect_uri = var("FACEBOOK_REDIRECT_URI")?;

    Some(FacebookConfig {
        app_id,
        app_secret: SecretString::from(app_secret),
        redirect_uri,
        graph_version: var("FACEBOOK_GRAPH_VERSION").unwrap_or_else(|| "v19.0".to_string()),
        dialog_url: var("FACEBOOK_DIALOG_URL")
            .unwrap_or_else(|| "https://www.facebook.com".to_string()),
        graph_url: var("FACEBOOK_GRAPH_URL")
            .unwrap_or_else(|| "https://graph.facebook.com".to_string()),
    })
}
