//! # routes
//!
//! HTTP transport of the Command Surface.
//!
//! | Method          | Path                 | Command                       |
//! |-----------------|----------------------|-------------------------------|
//! | GET             | `/api/health`        | counters (no API key needed)  |
//! | GET             | `/api/whoami`        | caller identity               |
//! | GET             | `/api/price`         | quote                         |
//! | GET             | `/api/account`       | account snapshot              |
//! | GET             | `/api/position`      | position in the instrument    |
//! | GET/POST/DELETE | `/api/alerts`        | list / set / clear alerts     |
//! | GET             | `/api/strategy`      | strategy status               |
//! | POST            | `/api/strategy/on`   | enable strategy               |
//! | POST            | `/api/strategy/off`  | disable strategy              |
//! | POST            | `/api/trades`        | manual trade                  |
//! | GET             | `/api/trades/logs`   | last ledger entries (admin)   |
//! | POST            | `/api/admin/stop`    | graceful stop (admin)         |
//! | POST            | `/api/admin/reset`   | clear all state (admin)       |
//! | GET (WS)        | `/ws/monitor`        | live event stream             |

use axum::{
    extract::rejection::JsonRejection,
    http::Uri,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_api_key;
use crate::error::EngineError;
use crate::state::SharedState;

pub mod admin;
pub mod alerts;
pub mod market;
pub mod monitor;
pub mod strategy;
pub mod trades;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ── Status / market ───────────────────────────────────────────────────
        .route("/api/health",       get(monitor::health))
        .route("/api/whoami",       get(market::whoami))
        .route("/api/price",        get(market::price))
        .route("/api/account",      get(market::account))
        .route("/api/position",     get(market::position))
        // ── Alerts ────────────────────────────────────────────────────────────
        .route(
            "/api/alerts",
            get(alerts::list_alerts)
                .post(alerts::set_alert)
                .delete(alerts::clear_alerts),
        )
        // ── Strategy ──────────────────────────────────────────────────────────
        .route("/api/strategy",     get(strategy::status))
        .route("/api/strategy/on",  post(strategy::enable))
        .route("/api/strategy/off", post(strategy::disable))
        // ── Trades ────────────────────────────────────────────────────────────
        .route("/api/trades",       post(trades::manual_trade))
        .route("/api/trades/logs",  get(trades::show_logs))
        // ── Admin ─────────────────────────────────────────────────────────────
        .route("/api/admin/stop",   post(admin::stop))
        .route("/api/admin/reset",  post(admin::reset))
        // ── Monitor ───────────────────────────────────────────────────────────
        .route("/ws/monitor",       get(monitor::ws_monitor))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

async fn not_found(uri: Uri) -> EngineError {
    EngineError::NotFound(format!("no route for {uri}"))
}

/// Turn a body that failed to parse into `InvalidInput` carrying `hint`.
pub(crate) fn invalid_body(rejection: JsonRejection, hint: &str) -> EngineError {
    EngineError::InvalidInput(format!("{}. {hint}", rejection.body_text()))
}
