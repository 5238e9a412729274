//! `POST /api/submit`: validate, deduplicate, forward, notify.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::{ApiError, AppState};
use crate::config::WebhookFailureMode;
use crate::error::IntegrationError;
use crate::integrations::AgentDirectory;
use crate::onboarding::model::{integrate_link, new_token};
use crate::onboarding::{
    Insertion, LeadPayload, OnboardingRecord, Submission, is_valid_e164, missing_required_fields,
    slugify,
};

pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(mut submission) =
        body.map_err(|e| ApiError::validation("Invalid request body", e.body_text()))?;
    for key in LeadPayload::SERVER_FIELDS {
        submission.extra.remove(*key);
    }

    let missing = missing_required_fields(&submission, state.settings.submission_variant);
    if !missing.is_empty() {
        return Err(ApiError::validation(
            "Missing required fields",
            format!("Required: {}", missing.join(", ")),
        ));
    }

    submission.owner_phone = submission.owner_phone.trim().to_string();
    submission.owner_email = submission.owner_email.trim().to_string();
    if !is_valid_e164(&submission.owner_phone) {
        return Err(ApiError::validation(
            "Invalid phone number",
            "Phone must be in E.164 format, e.g. +5511999999999",
        ));
    }

    if !state.webhook.is_configured() {
        return Err(ApiError::upstream(
            "Webhook not configured",
            IntegrationError::NotConfigured {
                service: "N8N_WEBHOOK_URL".into(),
            },
        ));
    }

    let base_agent_name = resolve_agent(&state.agents, &mut submission).await;

    let token = new_token();
    let slug = slugify(&submission.name);
    let payload = LeadPayload {
        integrate_link: integrate_link(&state.settings.public_base_url, &token),
        submission,
        base_agent_name,
        token,
        slug,
        created_at: Utc::now(),
    };
    let record = OnboardingRecord::new(payload);

    // Held as a reservation until the forward settles; an abort removes it.
    if let Insertion::Duplicate(existing) = state
        .store
        .insert_if_absent(record.clone().reserved())
        .await?
    {
        if existing.awaiting_forward {
            info!(token = %existing.token, "Duplicate of an in-flight submission rejected");
            return Err(ApiError::InProgress);
        }
        info!(
            token = %existing.token,
            slug = %existing.slug,
            "Duplicate submission rejected"
        );
        return Err(ApiError::Duplicate {
            integrate_link: existing.integrate_link().to_string(),
            token: existing.token,
        });
    }

    if let Err(e) = state.webhook.forward(&record.payload).await {
        match state.webhook.failure_mode() {
            WebhookFailureMode::Abort => {
                state.store.delete(&record.token).await?;
                return Err(ApiError::upstream("Failed to forward submission", e));
            }
            WebhookFailureMode::Ignore => {
                warn!(token = %record.token, error = %e, "Webhook forward failed, continuing");
            }
        }
    }
    state.store.mark_forwarded(&record.token).await?;

    let report = state.dispatcher.notify(&record).await;
    info!(
        token = %record.token,
        slug = %record.slug,
        delivered = ?report.delivered(),
        "Onboarding submission accepted"
    );

    let submission = &record.payload.submission;
    Ok(Json(json!({
        "success": true,
        "message": "Submission received. Check your WhatsApp or email for the activation link.",
        "token": record.token,
        "integrateLink": record.integrate_link(),
        "data": {
            "name": submission.name,
            "owner_name": submission.owner_name,
            "owner_email": submission.owner_email,
            "slug": record.slug,
            "base_agent": submission.base_agent,
            "base_agent_name": record.payload.base_agent_name,
        },
    })))
}

/// Swap the selected agent id for its `id_millis` and return its name.
/// A failed or empty lookup keeps the submitted id and an empty name.
async fn resolve_agent(agents: &AgentDirectory, submission: &mut Submission) -> String {
    match agents.get(&submission.base_agent).await {
        Ok(Some(agent)) => {
            submission.base_agent = agent.id_millis;
            agent.name
        }
        Ok(None) => {
            warn!(agent = %submission.base_agent, "Selected agent not found");
            String::new()
        }
        Err(e) => {
            error!(agent = %submission.base_agent, error = %e, "Agent lookup failed");
            String::new()
        }
    }
}
