//! # error
//!
//! Centralised engine error type.
//!
//! Every command and every evaluator step returns `EngineResult<_>`.  The
//! periodic evaluators catch these at the tick boundary; the HTTP Command
//! Surface converts them into structured JSON bodies through the
//! `IntoResponse` impl below so callers always get a machine-readable reason.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// PriceFeed failed or returned no data — the tick is skipped.
    #[error("Price feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Fewer closes than the long moving-average window needs.
    #[error("Insufficient history: have {have} closes, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    /// Brokerage declined the order or could not be reached.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Brokerage account / position query failed.
    #[error("Brokerage unavailable: {0}")]
    BrokerUnavailable(String),

    /// Privileged command from a non-privileged caller.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed command parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Trade ledger could not be read or written.
    #[error("Ledger I/O error: {0}")]
    Ledger(#[from] std::io::Error),

    /// Catch-all for unexpected failures.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::FeedUnavailable(_)         => "FEED_UNAVAILABLE",
            EngineError::InsufficientHistory { .. } => "INSUFFICIENT_HISTORY",
            EngineError::OrderRejected(_)           => "ORDER_REJECTED",
            EngineError::BrokerUnavailable(_)       => "BROKER_UNAVAILABLE",
            EngineError::Unauthorized(_)            => "UNAUTHORIZED",
            EngineError::InvalidInput(_)            => "INVALID_INPUT",
            EngineError::NotFound(_)                => "NOT_FOUND",
            EngineError::Ledger(_)                  => "LEDGER",
            EngineError::Internal(_)                => "INTERNAL",
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::InvalidInput(_)            => StatusCode::BAD_REQUEST,
            EngineError::Unauthorized(_)            => StatusCode::FORBIDDEN,
            EngineError::NotFound(_)                => StatusCode::NOT_FOUND,
            EngineError::InsufficientHistory { .. } => StatusCode::CONFLICT,
            EngineError::OrderRejected(_)
            | EngineError::BrokerUnavailable(_)     => StatusCode::BAD_GATEWAY,
            EngineError::FeedUnavailable(_)         => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Ledger(_) | EngineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "ok":    false,
            "kind":  self.kind(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
