use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::notify::{Notifier, split_message};

const TELEGRAM_API: &str = "https://api.telegram.org/";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends notifications through the Bot API `sendMessage` call. The user id
/// doubles as the private chat id.
pub struct TelegramNotifier {
    http_client: Client,
    base_url: String,
    token: String,
    max_message_size: usize,
}

impl TelegramNotifier {
    pub fn new(token: &str, timeout: Duration, max_message_size: usize) -> Result<Self> {
        Self::with_base_url(TELEGRAM_API, token, timeout, max_message_size)
    }

    pub fn with_base_url(base_url: &str, token: &str, timeout: Duration, max_message_size: usize) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_message_size,
        })
    }

    async fn send_chunk(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let resp: ApiResponse = self
            .http_client
            .post(&url)
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage response was not JSON")?;

        if !resp.ok {
            bail!(
                "sendMessage rejected: {}",
                resp.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, user_id: i64, text: &str) -> Result<()> {
        for part in split_message(text, self.max_message_size) {
            self.send_chunk(user_id, &part).await?;
        }
        Ok(())
    }
}
