//! Shared harness for the HTTP integration tests.
//!
//! `TestApp::start` runs the real router on a random port next to a stub
//! upstream server that plays the n8n webhook, Supabase, Facebook Graph and
//! Twilio.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use waba_onboard::api::{AppState, app_routes};
use waba_onboard::config::{
    AppConfig, FacebookConfig, SubmissionVariant, SupabaseConfig, TwilioConfig, WebhookConfig,
    WebhookFailureMode,
};
use waba_onboard::onboarding::{InMemoryStore, OnboardingStore};

/// Maximum time any test is allowed to run before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const PUBLIC_BASE_URL: &str = "http://onboard.test";
pub const GOOD_CODE: &str = "good-code";
pub const FB_ACCESS_TOKEN: &str = "fb-access-token";
pub const AGENT_ID_MILLIS: &str = "1712345678901";

/// Which webhook endpoint the app is pointed at.
#[derive(Debug, Clone, Copy)]
pub enum Webhook {
    Missing,
    Healthy,
    Failing,
    /// Answers 502 only after [`SLOW_WEBHOOK_DELAY`].
    SlowFailing,
}

pub const SLOW_WEBHOOK_DELAY: Duration = Duration::from_millis(500);

/// Requests captured by the stub upstream.
#[derive(Debug, Default)]
pub struct Recorded {
    pub webhook: Vec<Value>,
    pub messages: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Recorded>>;

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryStore>,
    pub recorded: Shared,
}

impl TestApp {
    pub async fn start(webhook: Webhook, failure_mode: WebhookFailureMode) -> Self {
        Self::start_with(webhook, failure_mode, true).await
    }

    /// Healthy app with `/debug/*` left unmounted.
    pub async fn without_debug_routes() -> Self {
        Self::start_with(Webhook::Healthy, WebhookFailureMode::Abort, false).await
    }

    pub async fn start_with(
        webhook: Webhook,
        failure_mode: WebhookFailureMode,
        debug_routes: bool,
    ) -> Self {
        let recorded = Shared::default();
        let upstream = serve(stub_upstream(Arc::clone(&recorded))).await;

        let webhook_url = match webhook {
            Webhook::Missing => None,
            Webhook::Healthy => Some(format!("{upstream}/webhook")),
            Webhook::Failing => Some(format!("{upstream}/webhook/fail")),
            Webhook::SlowFailing => Some(format!("{upstream}/webhook/slow-fail")),
        };

        let mut config = test_config(&upstream, webhook_url, failure_mode);
        config.debug_routes = debug_routes;
        let store = InMemoryStore::new();
        let dyn_store: Arc<dyn OnboardingStore> = store.clone();
        let state = AppState::from_config(&config, dyn_store).expect("state builds");
        let base = serve(app_routes(state)).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base,
            client,
            store,
            recorded,
        }
    }

    pub async fn healthy() -> Self {
        Self::start(Webhook::Healthy, WebhookFailureMode::Abort).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn submit(&self, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/api/submit"))
            .json(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub fn webhook_calls(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().webhook.clone()
    }

    pub fn messages(&self) -> Vec<HashMap<String, String>> {
        self.recorded.lock().unwrap().messages.clone()
    }
}

/// A complete business-profile submission.
pub fn submission(name: &str, owner_email: &str) -> Value {
    json!({
        "name": name,
        "owner_name": "Maria Silva",
        "owner_phone": "+15551234567",
        "owner_email": owner_email,
        "target_country": "US",
        "base_agent": "agent-1",
        "street": "1 Main St",
        "timezone": "America/New_York",
        "area_code": "555",
        "business_niche": "restaurant",
        "service_area": "Brooklyn",
        "business_hours": "08:00-18:00",
        "services_offered": "lunch, dinner",
        "services_not_offered": "catering",
    })
}

fn test_config(upstream: &str, webhook_url: Option<String>, mode: WebhookFailureMode) -> AppConfig {
    AppConfig {
        port: 0,
        public_base_url: PUBLIC_BASE_URL.to_string(),
        submission_variant: SubmissionVariant::BusinessProfile,
        debug_routes: true,
        webhook: WebhookConfig {
            url: webhook_url,
            timeout: Duration::from_secs(2),
            failure_mode: mode,
        },
        smtp: None,
        twilio: Some(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: SecretString::from("twilio-token"),
            whatsapp_sender: Some("+14155238886".into()),
            sms_sender: Some("+15005550006".into()),
            api_url: upstream.to_string(),
        }),
        supabase: Some(SupabaseConfig {
            url: upstream.to_string(),
            anon_key: SecretString::from("anon"),
        }),
        facebook: Some(FacebookConfig {
            app_id: "1234".into(),
            app_secret: SecretString::from("fb-secret"),
            redirect_uri: format!("{PUBLIC_BASE_URL}/auth/callback"),
            graph_version: "v19.0".into(),
            dialog_url: upstream.to_string(),
            graph_url: upstream.to_string(),
        }),
    }
}

/// Serve `app` on a random local port, return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

// ── Stub upstream ────────────────────────────────────────────────────

fn stub_upstream(recorded: Shared) -> Router {
    Router::new()
        .route("/webhook", post(webhook_ok))
        .route("/webhook/fail", post(webhook_fail))
        .route("/webhook/slow-fail", post(webhook_slow_fail))
        .route("/rest/v1/ai_agents", get(agents))
        .route("/v19.0/oauth/access_token", get(access_token))
        .route("/v19.0/me", get(me))
        .route("/2010-04-01/Accounts/{sid}/Messages.json", post(twilio_message))
        .with_state(recorded)
}

async fn webhook_ok(State(recorded): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    recorded.lock().unwrap().webhook.push(body);
    StatusCode::OK
}

async fn webhook_fail() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "workflow offline")
}

async fn webhook_slow_fail() -> impl IntoResponse {
    tokio::time::sleep(SLOW_WEBHOOK_DELAY).await;
    webhook_fail().await
}

async fn agents(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let agent = json!({
        "id": "agent-1",
        "name": "Receptionist",
        "description": "Answers the phone",
        "id_millis": AGENT_ID_MILLIS.parse::<u64>().unwrap(),
    });
    match params.get("id").map(String::as_str) {
        None | Some("eq.agent-1") => Json(json!([agent])),
        Some(_) => Json(json!([])),
    }
}

async fn access_token(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("code").map(String::as_str) == Some(GOOD_CODE)
        && params.get("client_secret").map(String::as_str) == Some("fb-secret")
    {
        (
            StatusCode::OK,
            Json(json!({"access_token": FB_ACCESS_TOKEN, "token_type": "bearer"})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {
                "message": "Invalid verification code format.",
                "type": "OAuthException",
                "code": 100
            }})),
        )
    }
}

async fn me(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("access_token").map(String::as_str) != Some(FB_ACCESS_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid OAuth access token.", "code": 190}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": "10001", "name": "Maria Silva", "email": "maria@example.com"})),
    )
}

/// WhatsApp sends fail (sender not approved), plain SMS succeeds.
async fn twilio_message(
    State(recorded): State<Shared>,
    Path(_sid): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let whatsapp = form
        .get("From")
        .is_some_and(|from| from.starts_with("whatsapp:"));
    recorded.lock().unwrap().messages.push(form);

    if whatsapp {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": 63007, "message": "Twilio could not find a Channel with the specified From address"})),
        )
    } else {
        (
            StatusCode::CREATED,
            Json(json!({"sid": "SM00000000000000000000000000000001", "status": "queued"})),
        )
    }
}
