// src/feed/mod.rs
pub mod parse;
pub mod provider;
pub mod types;

use metrics::counter;
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

pub use parse::parse_feed;
pub use provider::FeedProvider;
pub use types::{FeedEntry, FeedSource, NewsCandidate, ParsedFeed};

/// Plain text from an HTML-bearing field: decode entities, strip tags,
/// fold typographic quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip tags first so escaped markup in text survives as text
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)<[^>]+>").unwrap());
    let out = re_tags.replace_all(s, " ");

    // 2) HTML entity decode
    let out = html_escape::decode_html_entities(&out)
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 3) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Picks one configured feed at random and turns it into candidates.
pub struct FeedSampler {
    sources: Vec<Box<dyn FeedSource>>,
}

impl FeedSampler {
    pub fn new(sources: Vec<Box<dyn FeedSource>>) -> Self {
        Self { sources }
    }

    /// All usable entries of one random feed. Unreachable or malformed
    /// feeds yield an empty list.
    pub async fn sample(&self, rng: &mut StdRng) -> Vec<NewsCandidate> {
        let Some(source) = self.sources.choose(rng) else {
            return Vec::new();
        };

        let feed = match source.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!(error = ?e, feed = source.name(), "feed unavailable");
                counter!("bot_feed_errors_total").increment(1);
                return Vec::new();
            }
        };

        let label = feed
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| source.name().to_string());
        let total = feed.entries.len();
        let out: Vec<NewsCandidate> = feed
            .entries
            .into_iter()
            .filter_map(|e| NewsCandidate::from_entry(e, &label))
            .collect();

        tracing::debug!(feed = source.name(), total, usable = out.len(), "feed sampled");
        out
    }
}
