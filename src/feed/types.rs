// src/feed/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

use super::normalize_text;

/// One syndication entry with every optional field defaulted at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Raw summary, may contain HTML.
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Image announced by the feed itself (RSS enclosure / media:content).
    pub image: Option<String>,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// A news item that may be turned into a post. The link is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCandidate {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

impl NewsCandidate {
    /// Builds a candidate; `None` when title, summary or link is blank.
    pub fn from_entry(entry: FeedEntry, source: &str) -> Option<Self> {
        let title = normalize_text(&entry.title);
        let link = entry.link.trim().to_string();
        if title.is_empty() || link.is_empty() || normalize_text(&entry.summary).is_empty() {
            return None;
        }
        Some(Self {
            title,
            summary: entry.summary,
            link,
            source: source.to_string(),
            published_at: entry.published_at,
            image: entry.image,
        })
    }

    /// Summary with markup stripped.
    pub fn summary_text(&self) -> String {
        normalize_text(&self.summary)
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<ParsedFeed>;
    /// Fallback source label when the document carries no title.
    fn name(&self) -> &str;
}
