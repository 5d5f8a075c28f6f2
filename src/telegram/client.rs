//! HTTP client for the Telegram Bot API.
//!
//! Requests go to `{api_url}/bot{token}/{method}`. Request errors are stripped
//! of their URL before they are returned so the token never reaches the logs.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::types::*;
use crate::bot::{CallbackAck, Messenger, Outgoing};

/// Seconds Telegram holds a `getUpdates` call open waiting for updates.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Bot API client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Telegram API returned ok without a result")]
    Decode,
}

impl ClientError {
    fn http(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            client: Client::new(),
        }
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(ClientError::http)?;

        // Telegram reports failures in the JSON body, with a matching status.
        let status = response.status();
        let reply: ApiResponse<T> = response.json().await.map_err(ClientError::http)?;
        if !reply.ok {
            return Err(ClientError::Api {
                code: reply.error_code.unwrap_or(i64::from(status.as_u16())),
                description: reply.description.unwrap_or_default(),
            });
        }
        reply.result.ok_or(ClientError::Decode)
    }

    // ============================================================
    // Bot API methods
    // ============================================================

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, ClientError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: POLL_TIMEOUT_SECS,
            allowed_updates: vec!["message", "callback_query"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<(), ClientError> {
        let _sent: serde_json::Value = self.call("sendMessage", request).await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        request: &AnswerCallbackQueryRequest,
    ) -> Result<(), ClientError> {
        let _answered: bool = self.call("answerCallbackQuery", request).await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, message: &Outgoing) -> anyhow::Result<()> {
        self.send_message(&SendMessageRequest::from(message)).await?;
        Ok(())
    }

    async fn answer_callback(&self, ack: &CallbackAck) -> anyhow::Result<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id: ack.query_id.clone(),
            text: ack.text.clone(),
        };
        self.answer_callback_query(&request).await?;
        Ok(())
    }
}
