//! Submission and onboarding record data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::OnboardingStatus;

/// Form fields posted to `/api/submit`.
///
/// Every field defaults to empty so presence is checked by the validator,
/// not by deserialization. Unknown keys are kept in `extra` and forwarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    /// Business name.
    pub name: String,
    pub owner_name: String,
    /// E.164 phone, e.g. `+5511999999999`.
    pub owner_phone: String,
    pub owner_email: String,
    pub target_country: String,
    /// Selected agent id. Replaced by the agent's `id_millis` once resolved.
    pub base_agent: String,
    pub street: String,
    pub timezone: String,
    pub area_code: String,
    pub business_niche: String,
    pub service_area: String,
    pub business_hours: String,
    pub services_offered: String,
    pub services_not_offered: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Submission plus the fields the server adds. This is also the body
/// forwarded to the automation webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPayload {
    #[serde(flatten)]
    pub submission: Submission,
    /// Display name of the resolved agent, empty if the lookup failed.
    pub base_agent_name: String,
    pub token: String,
    pub slug: String,
    pub integrate_link: String,
    pub created_at: DateTime<Utc>,
}

impl LeadPayload {
    /// Keys the server sets. Clients cannot supply them through `extra`.
    pub const SERVER_FIELDS: &'static [&'static str] = &[
        "base_agent_name",
        "token",
        "slug",
        "integrate_link",
        "created_at",
    ];
}

/// A single onboarding, keyed by its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    pub token: String,
    pub slug: String,
    pub payload: LeadPayload,
    pub status: OnboardingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_user_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Reserved by an in-flight submission whose webhook forward has not
    /// succeeded yet. Duplicates of it get no token.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub awaiting_forward: bool,
}

impl OnboardingRecord {
    /// New pending record. Token and slug are taken from the payload.
    pub fn new(payload: LeadPayload) -> Self {
        Self {
            token: payload.token.clone(),
            slug: payload.slug.clone(),
            created_at: payload.created_at,
            payload,
            status: OnboardingStatus::Pending,
            facebook_access_token: None,
            facebook_user_data: None,
            updated_at: None,
            awaiting_forward: false,
        }
    }

    /// Same record, held as a reservation until [`mark_forwarded`] clears it.
    ///
    /// [`mark_forwarded`]: super::store::OnboardingStore::mark_forwarded
    pub fn reserved(mut self) -> Self {
        self.awaiting_forward = true;
        self
    }

    pub fn owner_email(&self) -> &str {
        &self.payload.submission.owner_email
    }

    pub fn integrate_link(&self) -> &str {
        &self.payload.integrate_link
    }
}

/// Partial update merged into an existing record by the store.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub status: Option<OnboardingStatus>,
    pub facebook_access_token: Option<String>,
    pub facebook_user_data: Option<serde_json::Value>,
}

impl RecordPatch {
    /// Patch applied when the Facebook OAuth callback succeeds.
    pub fn connected(access_token: String, user_data: serde_json::Value) -> Self {
        Self {
            status: Some(OnboardingStatus::Connected),
            facebook_access_token: Some(access_token),
            facebook_user_data: Some(user_data),
        }
    }
}

/// `{base}/connect?token={token}`.
pub fn integrate_link(base_url: &str, token: &str) -> String {
    format!("{}/connect?token={token}", base_url.trim_end_matches('/'))
}

/// A fresh opaque token (UUID v4, 122 random bits, hex without hyphens).
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrate_link_trims_trailing_slash() {
        assert_eq!(
            integrate_link("https://onboard.example.com/", "abc"),
            "https://onboard.example.com/connect?token=abc"
        );
    }

    #[test]
    fn tokens_are_unique_hex() {
        let a = new_token();
        let b = new_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn submission_keeps_unknown_fields() {
        let json = serde_json::json!({
            "name": "Acme",
            "owner_email": "a@b.com",
            "utm_source": "ads"
        });
        let submission: Submission = serde_json::from_value(json).unwrap();
        assert_eq!(submission.name, "Acme");
        assert!(submission.owner_phone.is_empty());
        assert_eq!(submission.extra["utm_source"], "ads");
    }

    #[test]
    fn payload_serializes_flat() {
        let record = fixtures::record("tok", "acme", "a@b.com");
        let json = serde_json::to_value(&record.payload).unwrap();
        assert_eq!(json["owner_email"], "a@b.com");
        assert_eq!(json["token"], "tok");
        assert_eq!(json["slug"], "acme");
        assert!(json.get("submission").is_none());
    }

    #[test]
    fn record_serializes_camel_case_and_skips_unlinked_fields() {
        let record = fixtures::record("tok", "acme", "a@b.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("facebookAccessToken").is_none());
        assert!(json.get("updatedAt").is_none());
        assert!(json.get("awaitingForward").is_none());

        let reserved = serde_json::to_value(record.reserved()).unwrap();
        assert_eq!(reserved["awaitingForward"], true);
    }
}
