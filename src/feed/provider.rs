// src/feed/provider.rs
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::parse::parse_feed;
use super::types::{FeedSource, ParsedFeed};

/// A single configured feed: fetched over HTTP, or parsed from an embedded document.
pub struct FeedProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl FeedProvider {
    pub fn from_url(url: &str, client: reqwest::Client) -> Self {
        Self {
            name: host_label(url),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }
}

#[async_trait]
impl FeedSource for FeedProvider {
    async fn fetch(&self) -> Result<ParsedFeed> {
        match &self.mode {
            Mode::Fixture(xml) => parse_feed(xml),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("feed GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("feed non-2xx {url}"))?
                    .text()
                    .await
                    .with_context(|| format!("feed body {url}"))?;
                parse_feed(&body).with_context(|| format!("feed parse {url}"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn host_label(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_label_strips_www() {
        assert_eq!(host_label("https://www.theverge.com/rss/index.xml"), "theverge.com");
        assert_eq!(host_label("not a url"), "not a url");
    }

    #[tokio::test]
    async fn fixture_mode_parses_document() {
        let xml = r#"<rss><channel><title>T</title>
            <item><title>A</title><link>https://x/1</link><description>d</description></item>
        </channel></rss>"#;
        let p = FeedProvider::from_fixture("fixture", xml);
        let feed = p.fetch().await.unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(p.name(), "fixture");
    }
}
