//! Facebook OAuth linking: `/connect` → Facebook dialog → `/auth/callback`.

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use super::{AppState, PageError};
use crate::onboarding::RecordPatch;

/// Where the callback sends the browser once the account is linked.
pub const SUCCESS_PATH: &str = "/connected";

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn connect(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> Result<Response, PageError> {
    let token = non_empty(query.token)
        .ok_or_else(|| PageError::BadRequest("Missing token".into()))?;

    let record = state
        .store
        .get(&token)
        .await?
        .ok_or_else(|| PageError::NotFound("Invalid or expired link".into()))?;

    let url = state.facebook.authorize_url(&record.token)?;
    info!(token = %record.token, "Redirecting to Facebook authorization");
    Ok(redirect(url.as_str()))
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, PageError> {
    if let Some(error) = query.error {
        let reason = query.error_description.unwrap_or(error);
        warn!(state = ?query.state, reason = %reason, "Facebook authorization denied");
        return Err(PageError::BadRequest(format!(
            "Authorization was not granted: {reason}"
        )));
    }

    let (Some(code), Some(token)) = (non_empty(query.code), non_empty(query.state)) else {
        return Err(PageError::BadRequest("Missing code or state".into()));
    };

    if state.store.get(&token).await?.is_none() {
        return Err(PageError::NotFound("Invalid or expired link".into()));
    }

    let access_token = state.facebook.exchange_code(&code).await?;
    let profile = state.facebook.fetch_profile(&access_token).await?;

    state
        .store
        .update(&token, RecordPatch::connected(access_token, profile))
        .await?
        .ok_or_else(|| PageError::NotFound("Invalid or expired link".into()))?;

    info!(token = %token, "WhatsApp Business account connected");
    Ok(redirect(SUCCESS_PATH))
}

pub async fn connected_page() -> Html<&'static str> {
    Html(CONNECTED_PAGE)
}

const CONNECTED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>WhatsApp connected</title>
  <style>
    body { font-family: system-ui, sans-serif; background: #f4f6f8; display: flex; align-items: center; justify-content: center; min-height: 100vh; margin: 0; }
    main { background: #fff; padding: 2.5rem; border-radius: 12px; box-shadow: 0 2px 12px rgba(0,0,0,.08); text-align: center; max-width: 28rem; }
    h1 { color: #128c7e; margin-top: 0; }
  </style>
</head>
<body>
  <main>
    <h1>All set!</h1>
    <p>Your WhatsApp Business account is connected. Your AI agent will be activated shortly.</p>
    <p>You can close this window.</p>
  </main>
</body>
</html>
"#;
