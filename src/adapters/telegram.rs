//! # adapters::telegram
//!
//! [`Notifier`] backed by the Telegram Bot API.  A destination is a chat id.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::Notifier;
use crate::error::{EngineError, EngineResult};
use crate::models::Destination;

const TELEGRAM_API: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client:  reqwest::Client,
    token:   String,
    timeout: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text:    &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok:          bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, token: String, timeout: Duration) -> Self {
        Self { client, token, timeout }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, destination: &Destination, text: &str) -> EngineResult<()> {
        let url = format!("{TELEGRAM_API}/bot{}/sendMessage", self.token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id: destination.as_str(), text })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| EngineError::Internal(anyhow::anyhow!("Telegram unreachable: {e}")))?;

        let status = response.status();
        let body: TelegramResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Internal(anyhow::anyhow!("Telegram response parse error: {e}")))?;

        if !status.is_success() || !body.ok {
            let reason = body.description.unwrap_or_else(|| status.to_string());
            warn!(%destination, %reason, "Telegram refused the message");
            return Err(EngineError::Internal(anyhow::anyhow!("Telegram error: {reason}")));
        }

        debug!(%destination, "Notification delivered");
        Ok(())
    }
}
