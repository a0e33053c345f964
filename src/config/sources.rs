// src/config/sources.rs
//! Feed list and keyword lists. Built-in defaults, optionally replaced by a
//! TOML or JSON file.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_PATH: &str = "BOT_SOURCES_PATH";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

const DEFAULT_FEEDS: &[&str] = &[
    "https://habr.com/ru/rss/flows/develop/all/?fl=ru",
    "https://www.ixbt.com/export/news.rss",
    "https://kod.ru/feed",
    "https://www.cnews.ru/inc/rss/news.xml",
    "https://stackoverflow.blog/feed/",
    "https://dev.to/feed",
    "https://medium.com/feed/tag/programming",
    "https://techcrunch.com/feed/",
    "https://www.digitaltrends.com/feed/",
    "https://thenextweb.com/feed",
    "https://www.pcworld.com/index.rss",
    "https://hnrss.org/frontpage",
    "https://www.theverge.com/rss/index.xml",
    "https://feeds.arstechnica.com/arstechnica/index",
    "https://www.blendernation.com/feed/",
    "https://80.lv/feed/",
    "https://www.cgchannel.com/feed/",
    "https://www.cgtrader.com/blog.rss",
    "https://3ddd.ru/news/rss",
    "https://www.rbc.ru/rss/",
];

const DEFAULT_BANNED: &[&str] = &[
    "украина",
    "україна",
    "ukraine",
    "zelensky",
    "зеленский",
    "киев",
    "київ",
    "донбасс",
    "донецк",
    "луганск",
    "россия",
    "russia",
    "политика",
    "война",
    "военные",
    "конфликт",
    "санкции",
    "путин",
    "мобилизация",
    "спецоперация",
];

fn owned(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn default_feeds() -> Vec<String> {
    owned(DEFAULT_FEEDS)
}

fn default_banned() -> Vec<String> {
    owned(DEFAULT_BANNED)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sources {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,
    #[serde(default = "default_banned")]
    pub banned_keywords: Vec<String>,
    /// Empty = no interest filtering.
    #[serde(default)]
    pub interest_keywords: Vec<String>,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            banned_keywords: default_banned(),
            interest_keywords: Vec::new(),
        }
    }
}

impl Sources {
    /// Load from an explicit path. TOML or JSON, picked by extension with a
    /// content sniff as fallback.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parsed = parse_sources(&content, &ext)
            .with_context(|| format!("parsing sources {}", path.display()))?;
        parsed.cleaned()
    }

    /// Resolution order:
    /// 1) `$BOT_SOURCES_PATH` (must exist)
    /// 2) config/sources.toml
    /// 3) built-in lists
    pub fn load_default(env_path: Option<&str>) -> Result<Self> {
        if let Some(p) = env_path {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path {p}"));
            }
            return Self::load_from(&pb);
        }
        let fallback = PathBuf::from(DEFAULT_SOURCES_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }

    fn cleaned(self) -> Result<Self> {
        let feeds = clean_list(self.feeds);
        if feeds.is_empty() {
            return Err(anyhow!("sources file lists no feeds"));
        }
        Ok(Self {
            feeds,
            banned_keywords: clean_list(self.banned_keywords),
            interest_keywords: clean_list(self.interest_keywords),
        })
    }
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Sources> {
    match hint_ext {
        "toml" => return toml::from_str(s).map_err(Into::into),
        "json" => return serde_json::from_str(s).map_err(Into::into),
        _ => {}
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|e| anyhow!("unsupported sources format: {e}"))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
