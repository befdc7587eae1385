//! # auth
//!
//! Who is calling, and are they allowed in at all.
//!
//! * [`require_api_key`] — `X-API-Key` gate over the whole HTTP surface.
//!   With no `API_KEY` configured every request passes (dev mode).
//!   `/api/health` is always open.
//! * [`Caller`] — the caller identity (`X-Caller-Id`) and the destination its
//!   alerts and notices belong to (`X-Destination`, defaulting to the caller
//!   id).
//!
//! ```bash
//! curl -H "X-API-Key: $API_KEY" -H "X-Caller-Id: 42" http://localhost:3000/api/alerts
//! ```

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::Destination;
use crate::state::SharedState;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const CALLER_HEADER: &str = "X-Caller-Id";
pub const DESTINATION_HEADER: &str = "X-Destination";

// ─── API key middleware ───────────────────────────────────────────────────────

pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    if path == "/api/health" {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided == expected {
        next.run(request).await
    } else {
        warn!(path, "❌ Unauthorized request — invalid or missing X-API-Key");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "ok":    false,
                "kind":  "UNAUTHORIZED",
                "error": "Unauthorized: invalid or missing X-API-Key header",
            })),
        )
            .into_response()
    }
}

// ─── Caller ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub id:          Option<String>,
    pub destination: Option<Destination>,
}

impl Caller {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Destination of this caller's alerts and notices.
    pub fn destination(&self) -> EngineResult<Destination> {
        self.destination.clone().ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "missing {DESTINATION_HEADER} (or {CALLER_HEADER}) header"
            ))
        })
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, CALLER_HEADER);
        let destination = header(parts, DESTINATION_HEADER)
            .or_else(|| id.clone())
            .map(Destination::new);

        Ok(Caller { id, destination })
    }
}
