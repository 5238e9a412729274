//! Facebook OAuth for linking a WhatsApp Business Account.
//!
//! Two Graph calls per callback: code → access token, then token → profile.
//! No retries.

use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::FacebookConfig;
use crate::error::IntegrationError;

const SERVICE: &str = "facebook";

/// Permissions requested on the OAuth dialog.
pub const SCOPES: &[&str] = &[
    "whatsapp_business_management",
    "whatsapp_business_messaging",
    "business_management",
];

/// Profile fields fetched after the token exchange.
pub const PROFILE_FIELDS: &str = "id,name,email";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Graph error envelope: `{"error": {"message": ..., "type": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

pub struct FacebookOAuth {
    http: reqwest::Client,
    config: Option<FacebookConfig>,
}

impl FacebookOAuth {
    pub fn new(http: reqwest::Client, config: Option<FacebookConfig>) -> Self {
        Self { http, config }
    }

    fn config(&self) -> Result<&FacebookConfig, IntegrationError> {
        self.config
            .as_ref()
            .ok_or_else(|| IntegrationError::NotConfigured {
                service: SERVICE.into(),
            })
    }

    fn graph_endpoint(config: &FacebookConfig, path: &str) -> String {
        format!(
            "{}/{}/{path}",
            config.graph_url.trim_end_matches('/'),
            config.graph_version
        )
    }

    /// Authorization dialog URL carrying `state` back to the callback.
    pub fn authorize_url(&self, state: &str) -> Result<Url, IntegrationError> {
        let config = self.config()?;
        let scope = SCOPES.join(",");
        let dialog = format!(
            "{}/{}/dialog/oauth",
            config.dialog_url.trim_end_matches('/'),
            config.graph_version
        );

        Url::parse_with_params(
            &dialog,
            &[
                ("client_id", config.app_id.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("state", state),
                ("scope", scope.as_str()),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| IntegrationError::InvalidResponse {
            service: SERVICE.into(),
            reason: format!("Invalid dialog URL {dialog}: {e}"),
        })
    }

    /// Exchange an authorization code for a user access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, IntegrationError> {
        let config = self.config()?;
        let resp = self
            .http
            .get(Self::graph_endpoint(config, "oauth/access_token"))
            .query(&[
                ("client_id", config.app_id.as_str()),
                ("client_secret", config.app_secret.expose_secret()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e, None))?;

        let token: TokenResponse = read_graph_response(resp).await?;
        Ok(token.access_token)
    }

    /// Basic profile of the user who granted access.
    pub async fn fetch_profile(
        &self,
        access_token: &str,
    ) -> Result<serde_json::Value, IntegrationError> {
        let config = self.config()?;
        let resp = self
            .http
            .get(Self::graph_endpoint(config, "me"))
            .query(&[("fields", PROFILE_FIELDS), ("access_token", access_token)])
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e, None))?;

        read_graph_response(resp).await
    }
}

async fn read_graph_response<T>(resp: reqwest::Response) -> Result<T, IntegrationError>
where
    T: serde::de::DeserializeOwned,
{
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| IntegrationError::from_reqwest(SERVICE, e, None))?;

    if !status.is_success() {
        let body = serde_json::from_str::<GraphErrorEnvelope>(&body)
            .map(|env| env.error.message)
            .unwrap_or(body);
        return Err(IntegrationError::UnexpectedStatus {
            service: SERVICE.into(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| IntegrationError::InvalidResponse {
        service: SERVICE.into(),
        reason: e.to_string(),
    })
}
