// src/image/providers.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
pub const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Image URLs for a query, in provider ranking order.
    async fn search(&self, query: &str) -> Result<Vec<String>>;
    fn name(&self) -> &str;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &str;
}

// ---- Unsplash search ----

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    urls: Option<PhotoUrls>,
}

#[derive(Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

/// `results[].urls.regular` of an Unsplash search body.
pub fn parse_search_results(body: &str) -> Result<Vec<String>> {
    let resp: SearchResp = serde_json::from_str(body).context("malformed search json")?;
    Ok(resp
        .results
        .into_iter()
        .filter_map(|p| p.urls.and_then(|u| u.regular))
        .filter(|u| !u.trim().is_empty())
        .collect())
}

pub struct UnsplashSearch {
    http: reqwest::Client,
    url: String,
    access_key: String,
}

impl UnsplashSearch {
    pub fn new(url: &str, access_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: crate::http::client(timeout)?,
            url: url.to_string(),
            access_key: access_key.to_string(),
        })
    }
}

#[async_trait]
impl ImageSearch for UnsplashSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("query", query),
                ("client_id", self.access_key.as_str()),
                ("per_page", "20"),
            ])
            .send()
            .await
            .context("unsplash request failed")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("unsplash HTTP {status}");
        }
        let body = resp.text().await.context("reading unsplash body")?;
        parse_search_results(&body)
    }

    fn name(&self) -> &str {
        "unsplash"
    }
}

// ---- OpenAI image generation ----

#[derive(Serialize)]
struct GenReq<'a> {
    model: &'a str,
    prompt: &'a str,
    quality: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct GenResp {
    data: Option<Vec<GenImage>>,
}

#[derive(Deserialize)]
struct GenImage {
    url: Option<String>,
}

/// `data[0].url` of an image-generation body.
pub fn parse_generation(body: &str) -> Result<String> {
    let resp: GenResp = serde_json::from_str(body).context("malformed generation json")?;
    resp.data
        .and_then(|d| d.into_iter().next())
        .and_then(|i| i.url)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow!("generation response without data[0].url"))
}

pub struct OpenAiImageGenerator {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: crate::http::client(timeout)?,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = GenReq {
            model: &self.model,
            prompt,
            quality: "standard",
            n: 1,
            size: "1024x1024",
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("image generation request failed")?;
        let status = resp.status();
        let body = resp.text().await.context("reading generation body")?;
        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            bail!("image generation HTTP {status}: {snippet}");
        }
        parse_generation(&body)
    }

    fn name(&self) -> &str {
        "openai-images"
    }
}
