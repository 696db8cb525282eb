//! EduBot Server - Headless Daemon
//!
//! Serves the empathetic tutoring chat API:
//! - Conversations and messages on /api/v1/conversations
//! - Legacy single-turn chat on /api/v1/chat
//! - Monitoring on /api/v1/stats, /api/v1/quota, /api/v1/queue/stats and /api/keys-status
//!
//! Access via: http://localhost:8000

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod api;
mod cli;
mod router;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use edubot_core::dispatch::{AdmissionGate, OpenRouterBackend, ThreadRandom};
use edubot_core::modules::{config, logger};
use edubot_core::service::{InMemoryConversationStore, LexiconClassifier};
use edubot_core::{ChatService, Dispatcher, InteractionMonitor, QuotaTracker};

use cli::Cli;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = PathBuf::from(config::log_dir_from_env());
    let _log_guard = logger::init_tracing(Some(log_dir.as_path()), &cli.log_level);

    info!("🚀 EduBot Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let app_config = config::load_from_env().context("Invalid configuration")?;

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .context("Failed to build HTTP client")?;
    let backend = Arc::new(OpenRouterBackend::new(http_client, app_config.dispatch.api_url.clone()));

    let gate = Arc::new(AdmissionGate::new(app_config.gate.capacity));
    let dispatcher =
        Dispatcher::new(app_config.dispatch.clone(), gate, backend, Arc::new(ThreadRandom))?;
    info!(
        "🔑 {} API keys, {} candidate models",
        dispatcher.pool_status().total_keys,
        app_config.dispatch.models.len()
    );

    let quota = QuotaTracker::with_system_clock(&app_config.quota);
    let monitor = if app_config.log.interaction_log {
        InteractionMonitor::with_log_dir(&log_dir)
    } else {
        InteractionMonitor::new()
    };

    let chat = ChatService::new(
        Arc::new(dispatcher),
        Arc::new(quota),
        Arc::new(LexiconClassifier),
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(monitor),
    )
    .with_charge_fallback(app_config.quota.charge_fallback);

    let state = AppState::new(chat);
    info!("✅ Application state initialized");

    let app = router::build_router(state, &cli.allowed_origins);

    let ip: std::net::IpAddr = cli
        .host
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", cli.host))?;
    let addr = SocketAddr::new(ip, cli.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("🔌 API available at http://{}/api/v1/", addr);

    axum::serve(listener, app).with_graceful_shutdown(server_utils::shutdown_signal()).await?;

    info!("👋 Server stopped");
    Ok(())
}
