//! Development-only inspection endpoints, mounted behind `ENABLE_DEBUG_ROUTES`.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::info;

use super::{ApiError, AppState};
use crate::onboarding::OnboardingRecord;

pub async fn get_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<OnboardingRecord>, ApiError> {
    state
        .store
        .get(&token)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            message: "Token not found".into(),
            details: format!("No onboarding record for token {token}"),
        })
}

/// Token, slug and status of every record.
pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.store.get_all().await?;
    let tokens: Vec<Value> = records
        .iter()
        .map(|r| json!({ "token": r.token, "slug": r.slug, "status": r.status }))
        .collect();

    Ok(Json(json!({ "success": true, "count": tokens.len(), "tokens": tokens })))
}

pub async fn clear(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let removed = state.store.clear().await?;
    info!(removed, "Onboarding store cleared via debug endpoint");

    Ok(Json(json!({ "success": true, "removed": removed })))
}
