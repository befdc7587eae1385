//! # routes::trades
//!
//! | Method | Path               | Description                            |
//! |--------|--------------------|----------------------------------------|
//! | POST   | `/api/trades`      | manual market order `{ "direction" }`  |
//! | GET    | `/api/trades/logs` | last ledger entries (admin only)       |

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Caller;
use crate::commands::LOG_TAIL;
use crate::error::EngineResult;
use crate::models::{cents, Side};
use crate::routes::invalid_body;
use crate::state::SharedState;

const CORRECT_FORMAT: &str = r#"Correct format: {"direction": "buy"}"#;

#[derive(Deserialize)]
pub struct TradeBody {
    pub direction: String,
}

/// POST /api/trades
pub async fn manual_trade(
    State(state): State<SharedState>,
    caller: Caller,
    body: Result<Json<TradeBody>, JsonRejection>,
) -> EngineResult<impl IntoResponse> {
    let Json(body) = body.map_err(|r| invalid_body(r, CORRECT_FORMAT))?;
    let side: Side = body.direction.parse()?;

    tracing::info!(caller = ?caller.id(), %side, "🖐️ Manual trade requested");
    let execution = state.manual_trade(side).await?;

    let verb = match side {
        Side::Buy  => "Bought",
        Side::Sell => "Sold",
    };
    let message = format!(
        "✅ {verb} {} {} at ${:.2}",
        state.config.order_qty,
        execution.entry.instrument,
        cents(execution.entry.price)
    );

    Ok(Json(json!({
        "ok":       true,
        "order_id": execution.ack.order_id,
        "status":   execution.ack.status,
        "entry":    execution.entry,
        "message":  message,
    })))
}

/// GET /api/trades/logs
pub async fn show_logs(
    State(state): State<SharedState>,
    caller: Caller,
) -> EngineResult<impl IntoResponse> {
    let entries = state.show_logs(caller.id()).await?;

    let message = if entries.is_empty() {
        match state.ledger.entry_count().await? {
            0 => "📭 No trades logged yet.".to_string(),
            n => format!("📭 Only {n} trades logged so far, fewer than {LOG_TAIL}."),
        }
    } else {
        let lines: Vec<String> = entries.iter().map(|e| e.to_line()).collect();
        format!("📜 Recent Trades:\n{}", lines.join("\n"))
    };

    Ok(Json(json!({
        "ok":      true,
        "count":   entries.len(),
        "entries": entries,
        "message": message,
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::{build_router, test_support::send};
    use crate::state::testing::{harness, ADMIN};
    use axum::http::{Method, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[tokio::test]
    async fn manual_buy_is_placed_and_ledgered() {
        let h = harness(dec!(248.1));
        let app = build_router(h.state.clone());

        let (status, body) = send(
            app,
            Method::POST,
            "/api/trades",
            Some("D1"),
            Some(json!({ "direction": "buy" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "✅ Bought 1 TSLA at $248.10");
        assert_eq!(h.broker.submitted().await.len(), 1);
        assert_eq!(h.state.ledger.tail(1).await.unwrap()[0].reason, "Manual Trade");
    }

    #[tokio::test]
    async fn reply_rounds_price_to_cents() {
        let h = harness(dec!(248.105));
        let (_, body) = send(
            build_router(h.state.clone()),
            Method::POST,
            "/api/trades",
            Some("D1"),
            Some(json!({ "direction": "sell" })),
        )
        .await;
        assert_eq!(body["message"], "✅ Sold 1 TSLA at $248.11");
    }

    #[tokio::test]
    async fn rejected_manual_trade_reports_bad_gateway() {
        let h = harness(dec!(250));
        h.broker.reject_orders(Some("market closed")).await;

        let (status, body) = send(
            build_router(h.state.clone()),
            Method::POST,
            "/api/trades",
            Some("D1"),
            Some(json!({ "direction": "sell" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "ORDER_REJECTED");
    }

    #[tokio::test]
    async fn logs_are_admin_only() {
        let h = harness(dec!(250));
        let app = build_router(h.state.clone());

        let (status, _) = send(app.clone(), Method::GET, "/api/trades/logs", Some("D1"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(app.clone(), Method::GET, "/api/trades/logs", Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "📭 No trades logged yet.");

        for _ in 0..3 {
            h.state.manual_trade(crate::models::Side::Buy).await.unwrap();
        }
        let (_, body) = send(app.clone(), Method::GET, "/api/trades/logs", Some(ADMIN), None).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["message"], "📭 Only 3 trades logged so far, fewer than 10.");

        for _ in 0..7 {
            h.state.manual_trade(crate::models::Side::Buy).await.unwrap();
        }
        let (_, body) = send(app, Method::GET, "/api/trades/logs", Some(ADMIN), None).await;
        assert_eq!(body["count"], 10);
        assert!(body["message"].as_str().unwrap().starts_with("📜 Recent Trades:"));
    }
}
