//! Health/status and the agent list proxy.

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

use super::{ApiError, AppState};

pub async fn get_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.store.len().await?;

    Ok(Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "webhook_configured": state.webhook.is_configured(),
        "records": records,
    })))
}

pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let agents = state
        .agents
        .list()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch agents", e))?;

    Ok(Json(json!({ "success": true, "agents": agents })))
}
