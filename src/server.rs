use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{info, warn};

use crate::relay::{Relay, WebhookPayload};

pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/webhook.json", post(webhook))
        .route("/_ping", get(ping))
        .with_state(relay)
}

/// Decode the webhook body and run the decision flow. The follow-up work
/// is spawned after the outcome is final so its failures can never change
/// the response.
async fn webhook(State(relay): State<Relay>, body: Bytes) -> Response {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("failed to decode webhook body: {err}");
            return (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("error decoding request body: {err}"),
            )
                .into_response();
        }
    };

    let (outcome, follow_ups) = relay.handle(payload).await;

    let background = relay.clone();
    tokio::spawn(async move {
        background.run_follow_ups(follow_ups).await;
    });

    outcome.into_response()
}

async fn ping() -> &'static str {
    "healthy"
}

pub async fn serve(listen: SocketAddr, relay: Relay) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!("listening on {listen}");

    axum::serve(listener, router(relay))
        .await
        .context("server error")?;

    Ok(())
}
