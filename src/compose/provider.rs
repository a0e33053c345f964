// src/compose/provider.rs
//! Text-generation providers speaking the OpenAI chat-completions dialect
//! (OpenRouter and OpenAI both do).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One strategy in the composer's fallback chain.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generated text, or an error when the call failed or the response
    /// carried no usable content.
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &str;
}

pub struct ChatCompletionsProvider {
    name: String,
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsProvider {
    pub fn new(name: &str, url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            http: crate::http::client(timeout)?,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMsg>,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// `choices[0].message.content` of a chat-completions body.
pub fn extract_content(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("malformed chat response json")?;
    if let Some(err) = resp.error {
        bail!(
            "provider error: {}",
            err.message.unwrap_or_else(|| "unknown".into())
        );
    }
    let choices = resp.choices.ok_or_else(|| anyhow!("response without choices"))?;
    let content = choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| anyhow!("response without choices[0].message.content"))?;
    if content.trim().is_empty() {
        bail!("empty content");
    }
    Ok(content)
}

#[async_trait]
impl TextProvider for ChatCompletionsProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        let status = resp.status();
        let body = resp.text().await.context("reading chat response body")?;
        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            bail!("{} HTTP {status}: {snippet}", self.name);
        }
        extract_content(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
