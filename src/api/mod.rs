//! HTTP surface: lead intake, OAuth linking, status and debug endpoints.

pub mod debug;
pub mod error;
pub mod oauth;
pub mod status;
pub mod submit;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::channels::{EmailChannel, NotificationDispatcher, SmsChannel, TwilioClient, WhatsAppChannel};
use crate::config::{AppConfig, SubmissionVariant};
use crate::error::IntegrationError;
use crate::integrations::{AgentDirectory, FacebookOAuth, WebhookForwarder};
use crate::onboarding::OnboardingStore;

pub use error::{ApiError, PageError};

/// Timeout for outbound HTTP and SMTP calls other than the webhook forward.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings the handlers read per request.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub public_base_url: String,
    pub submission_variant: SubmissionVariant,
    pub debug_routes: bool,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OnboardingStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub agents: Arc<AgentDirectory>,
    pub webhook: Arc<WebhookForwarder>,
    pub facebook: Arc<FacebookOAuth>,
    pub settings: Arc<ServiceSettings>,
}

impl AppState {
    /// Wire every integration from `config` around the given store.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn OnboardingStore>,
    ) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("waba-onboard/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| IntegrationError::RequestFailed {
                service: "http client".into(),
                reason: e.to_string(),
            })?;

        let twilio = TwilioClient::new(http.clone(), config.twilio.clone());
        let dispatcher = NotificationDispatcher::standard(
            Arc::new(WhatsAppChannel::new(Arc::clone(&twilio))),
            Arc::new(SmsChannel::new(twilio)),
            Arc::new(EmailChannel::new(config.smtp.clone(), HTTP_TIMEOUT)),
        );

        Ok(Self {
            store,
            dispatcher: Arc::new(dispatcher),
            agents: Arc::new(AgentDirectory::new(http.clone(), config.supabase.clone())),
            webhook: Arc::new(WebhookForwarder::new(http.clone(), config.webhook.clone())),
            facebook: Arc::new(FacebookOAuth::new(http, config.facebook.clone())),
            settings: Arc::new(ServiceSettings {
                public_base_url: config.public_base_url.clone(),
                submission_variant: config.submission_variant,
                debug_routes: config.debug_routes,
            }),
        })
    }
}

/// Build the full router. `/debug/*` is mounted only when enabled.
pub fn app_routes(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/status", get(status::get_status))
        .route("/api/agents", get(status::list_agents))
        .route("/api/submit", post(submit::submit))
        .route("/connect", get(oauth::connect))
        .route("/auth/callback", get(oauth::callback))
        .route("/callback", get(oauth::callback))
        .route("/connected", get(oauth::connected_page));

    if state.settings.debug_routes {
        router = router
            .route("/debug/tokens", get(debug::list_tokens))
            .route("/debug/token/{token}", get(debug::get_token))
            .route("/debug/clear", delete(debug::clear));
    }

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Route not found" })),
    )
}
