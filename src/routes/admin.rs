//! # routes::admin
//!
//! Privileged process control; only the configured admin caller gets through.
//!
//! | Method | Path               | Description                                  |
//! |--------|--------------------|----------------------------------------------|
//! | POST   | `/api/admin/stop`  | finish in-flight ticks, then shut down       |
//! | POST   | `/api/admin/reset` | clear every alert, strategy back to defaults |

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::Caller;
use crate::error::EngineResult;
use crate::state::SharedState;

/// POST /api/admin/stop
pub async fn stop(
    State(state): State<SharedState>,
    caller: Caller,
) -> EngineResult<impl IntoResponse> {
    state.admin_stop(caller.id())?;

    Ok(Json(json!({
        "ok":      true,
        "message": "🛑 Engine stopping by admin request.",
    })))
}

/// POST /api/admin/reset
pub async fn reset(
    State(state): State<SharedState>,
    caller: Caller,
) -> EngineResult<impl IntoResponse> {
    let cleared = state.admin_reset(caller.id()).await?;

    Ok(Json(json!({
        "ok":             true,
        "alerts_cleared": cleared,
        "message":        "♻️ Engine memory reset.",
    })))
}
