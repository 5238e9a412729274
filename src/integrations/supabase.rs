//! Supabase REST client for the `ai_agents` table.

use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::SupabaseConfig;
use crate::error::IntegrationError;

const SERVICE: &str = "supabase";

/// An AI agent a lead can pick on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Identifier the downstream automation expects.
    #[serde(deserialize_with = "string_or_number")]
    pub id_millis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Supabase ids and `id_millis` may come back as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

pub struct AgentDirectory {
    http: reqwest::Client,
    config: Option<SupabaseConfig>,
}

impl AgentDirectory {
    pub fn new(http: reqwest::Client, config: Option<SupabaseConfig>) -> Self {
        Self { http, config }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Vec<Agent>, IntegrationError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| IntegrationError::NotConfigured {
                service: SERVICE.into(),
            })?;
        let key = config.anon_key.expose_secret();

        let resp = self
            .http
            .get(format!("{}/rest/v1/ai_agents", config.url))
            .header("apikey", key)
            .bearer_auth(key)
            .query(params)
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e, None))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IntegrationError::UnexpectedStatus {
                service: SERVICE.into(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        resp.json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse {
                service: SERVICE.into(),
                reason: e.to_string(),
            })
    }

    /// All agents.
    pub async fn list(&self) -> Result<Vec<Agent>, IntegrationError> {
        self.query(&[("select", "id,name,description,id_millis,created_at")])
            .await
    }

    /// One agent by primary key, `None` if no row matches.
    pub async fn get(&self, id: &str) -> Result<Option<Agent>, IntegrationError> {
        let filter = format!("eq.{id}");
        let agents = self
            .query(&[
                ("id", filter.as_str()),
                ("select", "id,name,description,id_millis"),
            ])
            .await?;
        Ok(agents.into_iter().next())
    }
}
