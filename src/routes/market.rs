//! # routes::market
//!
//! | Method | Path            | Description                       |
//! |--------|-----------------|-----------------------------------|
//! | GET    | `/api/whoami`   | echo caller identity              |
//! | GET    | `/api/price`    | latest instrument price           |
//! | GET    | `/api/account`  | brokerage account snapshot        |
//! | GET    | `/api/position` | held quantity of the instrument   |

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::Caller;
use crate::error::EngineResult;
use crate::models::cents;
use crate::state::SharedState;

/// GET /api/whoami
pub async fn whoami(caller: Caller) -> impl IntoResponse {
    let message = match caller.id() {
        Some(id) => format!("👤 Your caller ID is: {id}"),
        None     => "👤 Anonymous caller (no X-Caller-Id header)".to_string(),
    };

    Json(json!({
        "ok":          true,
        "caller_id":   caller.id,
        "destination": caller.destination,
        "message":     message,
    }))
}

/// GET /api/price
pub async fn price(State(state): State<SharedState>) -> EngineResult<impl IntoResponse> {
    let price = state.quote().await?;
    let symbol = &state.config.symbol;

    Ok(Json(json!({
        "ok":      true,
        "symbol":  symbol,
        "price":   price,
        "message": format!("📊 {symbol}: ${:.2}", cents(price)),
    })))
}

/// GET /api/account
pub async fn account(State(state): State<SharedState>) -> EngineResult<impl IntoResponse> {
    let account = state.account().await?;

    let message = format!(
        "💼 Account\nEquity: ${:.2}\nBuying power: ${:.2}\nCash: ${:.2}\nStatus: {}",
        cents(account.equity),
        cents(account.buying_power),
        cents(account.cash),
        account.status
    );

    Ok(Json(json!({
        "ok":      true,
        "account": account,
        "message": message,
    })))
}

/// GET /api/position
pub async fn position(State(state): State<SharedState>) -> EngineResult<impl IntoResponse> {
    let position = state.position().await?;
    let symbol = &state.config.symbol;

    let message = match &position {
        Some(p) => format!("📦 You hold {} {symbol} shares (value ${:.2})", p.qty, cents(p.market_value)),
        None    => format!("⚠️ No {symbol} shares held."),
    };

    Ok(Json(json!({
        "ok":       true,
        "position": position,
        "message":  message,
    })))
}
