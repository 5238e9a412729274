use std::sync::Arc;

use anyhow::Context;
use waba_onboard::api::{AppState, app_routes};
use waba_onboard::config::AppConfig;
use waba_onboard::onboarding::{InMemoryStore, OnboardingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Optional .env, real environment wins
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    eprintln!("📇 WABA Onboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://0.0.0.0:{}", config.port);
    eprintln!("   Public URL: {}", config.public_base_url);
    eprintln!(
        "   Webhook: {} (on failure: {:?})",
        config.webhook.url.as_deref().unwrap_or("not configured"),
        config.webhook.failure_mode,
    );
    eprintln!(
        "   Integrations: smtp={} twilio={} supabase={} facebook={}",
        config.smtp.is_some(),
        config.twilio.is_some(),
        config.supabase.is_some(),
        config.facebook.is_some(),
    );
    if config.debug_routes {
        eprintln!("   Debug routes: /debug/token/{{token}}, /debug/tokens, /debug/clear");
    }
    eprintln!();
    config.log_integrations();

    // ── State ────────────────────────────────────────────────────────────
    let store: Arc<dyn OnboardingStore> = InMemoryStore::new();
    let state = AppState::from_config(&config, store)?;
    let app = app_routes(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Onboarding server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
