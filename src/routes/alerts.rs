//! # routes::alerts
//!
//! | Method | Path          | Description                          |
//! |--------|---------------|--------------------------------------|
//! | GET    | `/api/alerts` | caller's pending alerts              |
//! | POST   | `/api/alerts` | `{ "price": 250, "direction": "buy" }` |
//! | DELETE | `/api/alerts` | drop all of the caller's alerts      |

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Caller;
use crate::error::{EngineError, EngineResult};
use crate::models::{cents, Side};
use crate::routes::invalid_body;
use crate::state::SharedState;

const CORRECT_FORMAT: &str = r#"Correct format: {"price": 250, "direction": "buy"}"#;

/// `price` may arrive as a JSON number or a string.
#[derive(Deserialize)]
pub struct SetAlertBody {
    pub price:     Value,
    pub direction: String,
}

impl SetAlertBody {
    fn parse(&self) -> EngineResult<(Decimal, Side)> {
        let price = match &self.price {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s.trim()),
            _ => None,
        }
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| invalid(&format!("price must be a positive number, got {}", self.price)))?;

        let side = self
            .direction
            .parse::<Side>()
            .map_err(|e| invalid(&e.to_string()))?;

        Ok((price, side))
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn invalid(problem: &str) -> EngineError {
    EngineError::InvalidInput(format!("{problem}. {CORRECT_FORMAT}"))
}

/// POST /api/alerts
pub async fn set_alert(
    State(state): State<SharedState>,
    caller: Caller,
    body: Result<Json<SetAlertBody>, JsonRejection>,
) -> EngineResult<impl IntoResponse> {
    let destination = caller.destination()?;
    let Json(body) = body.map_err(|r| invalid_body(r, CORRECT_FORMAT))?;
    let (price, side) = body.parse()?;

    let alert = state.set_alert(&destination, price, side).await?;
    let symbol = &state.config.symbol;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":      true,
            "alert":   alert,
            "message": format!("🔔 Alert set: {side} if {symbol} reaches ${:.2}", cents(price)),
        })),
    ))
}

/// GET /api/alerts
pub async fn list_alerts(
    State(state): State<SharedState>,
    caller: Caller,
) -> EngineResult<impl IntoResponse> {
    let destination = caller.destination()?;
    let alerts = state.list_alerts(&destination).await;

    let message = if alerts.is_empty() {
        "ℹ️ You have no alerts set.".to_string()
    } else {
        let lines: Vec<String> = alerts
            .iter()
            .map(|a| format!("- {} at ${:.2}", a.side, cents(a.threshold)))
            .collect();
        format!("📋 Your alerts:\n{}", lines.join("\n"))
    };

    Ok(Json(json!({
        "ok":      true,
        "count":   alerts.len(),
        "alerts":  alerts,
        "message": message,
    })))
}

/// DELETE /api/alerts
pub async fn clear_alerts(
    State(state): State<SharedState>,
    caller: Caller,
) -> EngineResult<impl IntoResponse> {
    let destination = caller.destination()?;
    let removed = state.clear_alerts(&destination).await;

    Ok(Json(json!({
        "ok":      true,
        "removed": removed,
        "message": "🧹 All alerts cleared.",
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::{build_router, test_support::send};
    use crate::state::testing::harness;
    use axum::http::{Method, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[tokio::test]
    async fn set_list_clear_round_trip() {
        let h = harness(dec!(260));
        let app = build_router(h.state.clone());

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/alerts",
            Some("D1"),
            Some(json!({ "price": 250, "direction": "buy" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "🔔 Alert set: BUY if TSLA reaches $250.00");

        let (_, body) = send(
            app.clone(),
            Method::POST,
            "/api/alerts",
            Some("D1"),
            Some(json!({ "price": "275.5", "direction": "SELL" })),
        )
        .await;
        assert_eq!(body["alert"]["side"], "SELL");

        let (status, body) = send(app.clone(), Method::GET, "/api/alerts", Some("D1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);

        let (_, body) = send(app.clone(), Method::GET, "/api/alerts", Some("D2"), None).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["message"], "ℹ️ You have no alerts set.");

        let (_, body) = send(app.clone(), Method::DELETE, "/api/alerts", Some("D1"), None).await;
        assert_eq!(body["removed"], 2);

        let (_, body) = send(app, Method::GET, "/api/alerts", Some("D1"), None).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn malformed_alert_gets_corrective_message() {
        let h = harness(dec!(260));
        let app = build_router(h.state.clone());

        for bad in [
            json!({ "price": -5, "direction": "buy" }),
            json!({ "price": "abc", "direction": "buy" }),
            json!({ "price": 250, "direction": "hold" }),
            json!({ "direction": "buy" }),
        ] {
            let (status, body) =
                send(app.clone(), Method::POST, "/api/alerts", Some("D1"), Some(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["kind"], "INVALID_INPUT");
            assert!(body["error"].as_str().unwrap().contains("Correct format"));
        }

        assert_eq!(h.state.alerts.lock().await.pending_count(), 0);
    }

    #[tokio::test]
    async fn alerts_need_a_destination() {
        let h = harness(dec!(260));
        let (status, _) = send(build_router(h.state.clone()), Method::GET, "/api/alerts", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
