// src/notify/telegram.rs
use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::Publisher;
use crate::compose::markup::truncate_html;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// Bot API limit for photo captions.
pub const CAPTION_LIMIT: usize = 1024;
/// Bot API limit for message text.
pub const MESSAGE_LIMIT: usize = 4096;

#[derive(Clone)]
pub struct TelegramPublisher {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
}

/// Which Bot API method a post goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Photo { photo: String, caption: String },
    Message { text: String },
}

/// Photo with caption when it fits, otherwise a text-only message. Long
/// messages are cut without breaking the markup.
pub fn plan_delivery(text: &str, image: Option<&str>) -> Delivery {
    match image {
        Some(photo) if text.chars().count() <= CAPTION_LIMIT => Delivery::Photo {
            photo: photo.to_string(),
            caption: text.to_string(),
        },
        _ => Delivery::Message {
            text: truncate_html(text, MESSAGE_LIMIT),
        },
    }
}

impl Delivery {
    pub fn method(&self) -> &'static str {
        match self {
            Delivery::Photo { .. } => "sendPhoto",
            Delivery::Message { .. } => "sendMessage",
        }
    }

    /// Form fields for the Bot API call, HTML parse mode included.
    pub fn form(self, chat_id: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("chat_id", chat_id.to_string())];
        match self {
            Delivery::Photo { photo, caption } => {
                form.push(("photo", photo));
                form.push(("caption", caption));
            }
            Delivery::Message { text } => form.push(("text", text)),
        }
        form.push(("parse_mode", "HTML".to_string()));
        form
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Success only for a 2xx status whose body says `"ok": true`.
pub fn check_response(method: &str, status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<ApiResponse>(body).ok() {
        Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
        Some(ApiResponse { description, .. }) => Err(anyhow!(
            "telegram {method} HTTP {status}: {}",
            description.unwrap_or_default()
        )),
        None => Err(anyhow!("telegram {method} HTTP {status}: unreadable body")),
    }
}

impl TelegramPublisher {
    pub fn new(token: String, chat_id: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            token,
            chat_id,
            client: crate::http::client(timeout)?,
        })
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }
}

#[async_trait::async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, text: &str, image: Option<&str>) -> Result<()> {
        let delivery = plan_delivery(text, image);
        let method = delivery.method();
        if image.is_some() && method == "sendMessage" {
            tracing::info!("post exceeds caption limit, sending text-only");
        }

        let rsp = self
            .client
            .post(self.endpoint(method))
            .form(&delivery.form(&self.chat_id))
            .send()
            .await
            // the URL embeds the bot token, keep it out of the error chain
            .map_err(|e| anyhow!("telegram {method} request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let body = rsp
            .text()
            .await
            .map_err(|e| anyhow!("telegram {method} body unreadable: {}", e.without_url()))?;
        check_response(method, status, &body)
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
