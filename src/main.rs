use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_bot::config::Config;
use issue_bot::github::{OctocrabClient, build_octocrab};
use issue_bot::plugins::PluginRegistry;
use issue_bot::scheduler::Scheduler;
use issue_bot::server::{AppState, build_router};
use issue_bot::webhooks::WebhookSecret;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_bot=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    let octocrab = build_octocrab(config.github_token.clone(), config.request_timeout())
        .context("failed to build GitHub client")?;
    let github = OctocrabClient::unscoped(octocrab, config.client_settings());

    let registry = Arc::new(PluginRegistry::with_default_plugins());
    let settings = Arc::new(config.plugin_settings());
    let shutdown = CancellationToken::new();

    for event in registry.event_names() {
        info!(event, plugins = ?registry.plugins_for(event), "Registered plugins");
    }

    let schedules = Scheduler::new(
        Arc::clone(&registry),
        github.clone(),
        Arc::clone(&settings),
        config.schedule_config(),
        shutdown.clone(),
    )
    .spawn();

    let app = build_router(AppState::new(
        WebhookSecret::new(config.webhook_secret.as_bytes()),
        registry,
        github.with_retry_policy(config.webhook_retry_policy()),
        settings,
        shutdown.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("listening on {}", config.listen_addr);

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            signal.cancel();
        })
        .await
        .context("server error")?;

    shutdown.cancel();
    for handle in schedules {
        let _ = handle.await;
    }

    Ok(())
}
