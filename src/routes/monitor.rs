//! # routes::monitor
//!
//! | Method   | Path          | Description                              |
//! |----------|---------------|------------------------------------------|
//! | GET (WS) | `/ws/monitor` | real-time [`EngineEvent`] stream         |
//! | GET      | `/api/health` | tick / trade counters and uptime         |
//!
//! [`EngineEvent`]: crate::events::EngineEvent

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, info};

use crate::state::SharedState;

// ─── WebSocket Handler ────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 Monitor client connected");

    // ── Snapshot on connect ───────────────────────────────────────────────────
    let snapshot = {
        let stats = state.stats().await;
        let strategy = state.strategy_status().await;
        json!({
            "event":    "SNAPSHOT",
            "stats":    stats,
            "strategy": strategy,
        })
        .to_string()
    };

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Monitor client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 Monitor client disconnected");
}

// ─── Health ───────────────────────────────────────────────────────────────────

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let stats = state.stats().await;
    Json(json!({
        "ok":     true,
        "status": "running",
        "stats":  stats,
    }))
}

#[cfg(test)]
mod tests {
    use crate::models::Side;
    use crate::routes::{build_router, test_support::send};
    use crate::state::testing::harness;
    use axum::http::{Method, StatusCode};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn health_reports_counters() {
        let h = harness(dec!(250));
        h.state.manual_trade(Side::Buy).await.unwrap();

        let (status, body) = send(build_router(h.state.clone()), Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["trade_count"], 1);
        assert_eq!(body["stats"]["strategy_enabled"], false);
        assert_eq!(body["stats"]["symbol"], "TSLA");
    }
}
