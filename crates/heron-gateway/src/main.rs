use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use heron_core::config::HeronConfig;
use heron_predict::{PredictClient, RetryPolicy};
use heron_slack::{handler, BotIdentity, SlackAdapter};

mod app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heron_gateway=info,tower_http=debug".into()),
        )
        .init();

    // explicit path via HERON_CONFIG, otherwise ./heron.toml
    let config_path = std::env::var("HERON_CONFIG").ok();
    let config = Arc::new(
        HeronConfig::load(config_path.as_deref()).context("configuration load failed")?,
    );

    let predict = Arc::new(PredictClient::new(
        config.predict.base_url.clone(),
        config.predict.api_key.clone(),
        config.predict.flow_id.clone(),
        RetryPolicy::from(&config.predict.retry),
    ));
    info!(endpoint = %predict.endpoint(), "prediction client ready");

    let (adapter, mut events) = SlackAdapter::connect(&config.slack).await?;
    let adapter = Arc::new(adapter);

    // Resolve the bot's own user id up front so the first events don't
    // pay the lookup. Failure is not fatal, identity re-resolves lazily.
    let identity = Arc::new(BotIdentity::new());
    match adapter.bot_user_id().await {
        Ok(user_id) => {
            info!(user_id = %user_id, "bot identity resolved");
            identity.set(user_id).await;
        }
        Err(e) => warn!(error = %e, "initial auth.test failed, will retry per event"),
    }

    // Shared HTTP client for attachment downloads.
    let http = reqwest::Client::new();

    let addr: SocketAddr = format!("{}:{}", config.health.bind, config.health.port)
        .parse()
        .context("invalid health bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind health listener on {addr}"))?;
    info!("health listener on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app::build_router()).await {
            warn!(error = %e, "health listener stopped");
        }
    });

    info!("heron gateway running");
    loop {
        tokio::select! {
            maybe_msg = events.recv() => {
                let Some(msg) = maybe_msg else {
                    warn!("slack event stream closed, shutting down");
                    break;
                };
                // Each event is handled independently, no cross-event
                // ordering guarantees.
                let adapter = Arc::clone(&adapter);
                let predict = Arc::clone(&predict);
                let identity = Arc::clone(&identity);
                let config = Arc::clone(&config);
                let http = http.clone();
                tokio::spawn(async move {
                    handler::handle_message(&adapter, &predict, &identity, &http, &config, msg)
                        .await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
