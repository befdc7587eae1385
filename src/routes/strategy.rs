//! # routes::strategy
//!
//! | Method | Path                | Description                        |
//! |--------|---------------------|------------------------------------|
//! | GET    | `/api/strategy`     | enabled flag and last traded signal |
//! | POST   | `/api/strategy/on`  | enable; caller receives notices    |
//! | POST   | `/api/strategy/off` | disable                            |

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::Caller;
use crate::state::SharedState;

/// GET /api/strategy
pub async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    let strategy = state.strategy_status().await;
    let label = if strategy.enabled { "ENABLED ✅" } else { "DISABLED ❌" };

    Json(json!({
        "ok":       true,
        "strategy": strategy,
        "message":  format!("📊 Strategy status: {label}"),
    }))
}

/// POST /api/strategy/on
pub async fn enable(State(state): State<SharedState>, caller: Caller) -> impl IntoResponse {
    let strategy = state.strategy_on(caller.destination).await;

    Json(json!({
        "ok":       true,
        "strategy": strategy,
        "message":  "📈 Moving Average Strategy ENABLED ✅",
    }))
}

/// POST /api/strategy/off
pub async fn disable(State(state): State<SharedState>) -> impl IntoResponse {
    let strategy = state.strategy_off().await;

    Json(json!({
        "ok":       true,
        "strategy": strategy,
        "message":  "⏹ Moving Average Strategy DISABLED ❌",
    }))
}
