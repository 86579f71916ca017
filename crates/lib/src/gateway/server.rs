//! Gateway HTTP server: health probe and inbound webhook routes.

use crate::backend::{Backend, MemoryBackend};
use crate::channels::{
    ChannelHandler, ChannelRegistry, OutgoingMsg, RocketChatHandler, SendContext, SendOutcome,
};
use crate::config::{self, Config};
use crate::gateway::protocol::ReceiveResponse;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared state for the gateway (config, channels, host store).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub registry: Arc<ChannelRegistry>,
    pub backend: Arc<dyn Backend>,
}

impl GatewayState {
    /// Build handlers from config and register every configured channel.
    /// Fails on the first channel whose config its handler rejects.
    pub async fn from_config(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let api_url = config::resolve_rocketchat_api_url(&config);
        log::info!("rocketchat api url: {}", api_url);
        let registry =
            ChannelRegistry::new().with_handler(Arc::new(RocketChatHandler::with_http(api_url)));
        for channel in &config.channels {
            let uuid = channel.uuid;
            registry
                .register(channel.clone())
                .await
                .with_context(|| format!("registering channel {}", uuid))?;
            log::info!("channel {} ({}) registered", uuid, channel.channel_type);
        }
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            backend,
        })
    }

    /// Hand one outgoing message to its channel's handler and store the resulting status.
    /// Exactly one attempt; retry policy belongs to the caller.
    pub async fn send(&self, msg: &OutgoingMsg) -> Result<SendOutcome> {
        let channel = self
            .registry
            .get(&msg.channel_uuid)
            .await
            .with_context(|| format!("unknown channel {}", msg.channel_uuid))?;
        let handler = self
            .registry
            .handler(&channel.channel_type)
            .with_context(|| format!("no handler for channel type {}", channel.channel_type))?;
        let ctx = SendContext {
            timeout: config::request_timeout(&self.config),
            ..SendContext::default()
        };
        let outcome = handler.send_msg(&channel, msg, &ctx).await;
        let status = &outcome.status;
        if let Err(e) = self.backend.write_status(status).await {
            log::warn!(
                "storing status for msg {} on channel {} failed: {}",
                status.msg_id(),
                status.channel_uuid(),
                e
            );
        }
        Ok(outcome)
    }
}

/// Router with all gateway routes. Inbound webhooks are served at `/c/{type}/{uuid}/receive`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/c/:channel_type/:uuid/receive", post(receive_webhook))
        .with_state(state)
}

/// Run the gateway until Ctrl-C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState::from_config(config, Arc::new(MemoryBackend::new())).await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("listening for shutdown signal failed: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "channels": state.registry.ids().await.len(),
    }))
}

fn reply(status: StatusCode, body: ReceiveResponse) -> (StatusCode, Json<ReceiveResponse>) {
    (status, Json(body))
}

/// POST /c/{type}/{uuid}/receive: run the channel's inbound pipeline and store what it produced.
/// Ignorable requests get 200 so the provider does not retry them.
async fn receive_webhook(
    State(state): State<GatewayState>,
    Path((channel_type, uuid)): Path<(String, String)>,
    body: Bytes,
) -> (StatusCode, Json<ReceiveResponse>) {
    let Ok(uuid) = Uuid::parse_str(&uuid) else {
        return reply(StatusCode::NOT_FOUND, ReceiveResponse::error("invalid channel uuid"));
    };
    let channel = match state.registry.get(&uuid).await {
        Some(c) if c.channel_type.as_str().eq_ignore_ascii_case(&channel_type) => c,
        _ => {
            log::debug!("webhook for unknown channel {}/{}", channel_type, uuid);
            return reply(StatusCode::NOT_FOUND, ReceiveResponse::error("channel not found"));
        }
    };
    let Some(handler) = state.registry.handler(&channel.channel_type) else {
        return reply(StatusCode::NOT_FOUND, ReceiveResponse::error("channel not found"));
    };

    let outcome = handler.receive(&channel, &body);
    let entry = &outcome.log;
    log::debug!(
        "{} on channel {} at {}",
        entry.label(),
        entry.channel_uuid(),
        entry.created_on().to_rfc3339()
    );
    if let Err(e) = state.backend.write_channel_log(entry).await {
        log::warn!("storing channel log for {} failed: {}", uuid, e);
    }

    match outcome.result {
        Ok(events) => {
            for event in &events {
                if let Err(e) = state.backend.write_event(event).await {
                    log::warn!("storing event for {} failed: {}", uuid, e);
                    return reply(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ReceiveResponse::error(e.to_string()),
                    );
                }
            }
            reply(StatusCode::OK, ReceiveResponse::accepted(&events))
        }
        Err(e) if e.is_ignorable() => reply(StatusCode::OK, ReceiveResponse::ignored(e.to_string())),
        Err(e) => reply(StatusCode::BAD_REQUEST, ReceiveResponse::error(e.to_string())),
    }
}
