// src/config/mod.rs
//! Runtime configuration, built once at startup from the environment and
//! handed to each component. Nothing reads the environment after this.

pub mod sources;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::compose::provider::{OPENAI_CHAT_URL, OPENROUTER_URL};
use crate::compose::{DEFAULT_MIN_POST_CHARS, DEFAULT_MIN_POST_WORDS};
use crate::filter::DEFAULT_MIN_SUMMARY_CHARS;
use crate::image::providers::{OPENAI_IMAGES_URL, UNSPLASH_SEARCH_URL};
use crate::notify::telegram::TELEGRAM_API_BASE;
use crate::orchestrator::DEFAULT_COMPOSE_CYCLES;
use crate::selector::DEFAULT_SELECT_ATTEMPTS;
pub use sources::Sources;

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_base: String,
}

/// One chat-completions endpoint in the fallback chain.
#[derive(Clone)]
pub struct TextProviderConfig {
    pub name: String,
    pub url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone)]
pub struct UnsplashConfig {
    pub access_key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct ImageGenConfig {
    pub api_key: String,
    pub url: String,
    pub model: String,
}

#[derive(Clone)]
pub struct Config {
    /// `None` only in dry-run mode.
    pub telegram: Option<TelegramConfig>,
    /// Primary first.
    pub text_providers: Vec<TextProviderConfig>,
    pub unsplash: Option<UnsplashConfig>,
    pub image_generation: Option<ImageGenConfig>,
    pub data_dir: PathBuf,
    pub sources: Sources,
    pub select_attempts: usize,
    pub compose_cycles: usize,
    pub shuffle_entries: bool,
    pub min_summary_chars: usize,
    pub min_post_words: usize,
    pub min_post_chars: usize,
    pub http_timeout: Duration,
    pub interval: Option<Duration>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |k: &str, d: &str| get(k).unwrap_or_else(|| d.to_string());

        let dry_run = flag(get("BOT_DRY_RUN"));

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("CHANNEL_USERNAME")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id,
                api_base: or("TELEGRAM_API_BASE", TELEGRAM_API_BASE),
            }),
            _ if dry_run => None,
            (None, _) => bail!("TELEGRAM_BOT_TOKEN is not set"),
            (_, None) => bail!("CHANNEL_USERNAME is not set"),
        };

        let mut text_providers = Vec::new();
        if let Some(key) = get("OPENROUTER_API_KEY") {
            text_providers.push(TextProviderConfig {
                name: "openrouter".into(),
                url: or("OPENROUTER_URL", OPENROUTER_URL),
                api_key: key,
                model: or("OPENROUTER_MODEL", "openai/gpt-3.5-turbo"),
            });
        }
        let openai_key = get("OPENAI_API_KEY");
        if let Some(key) = &openai_key {
            text_providers.push(TextProviderConfig {
                name: "openai".into(),
                url: or("OPENAI_URL", OPENAI_CHAT_URL),
                api_key: key.clone(),
                model: or("OPENAI_MODEL", "gpt-4o-mini"),
            });
        }
        if text_providers.is_empty() {
            bail!("no text provider configured: set OPENROUTER_API_KEY and/or OPENAI_API_KEY");
        }

        let unsplash = get("UNSPLASH_ACCESS_KEY").map(|access_key| UnsplashConfig {
            access_key,
            url: or("UNSPLASH_URL", UNSPLASH_SEARCH_URL),
        });

        let image_generation = match (flag(get("BOT_IMAGE_GENERATION")), openai_key) {
            (true, Some(api_key)) => Some(ImageGenConfig {
                api_key,
                url: or("OPENAI_IMAGE_URL", OPENAI_IMAGES_URL),
                model: or("OPENAI_IMAGE_MODEL", "dall-e-3"),
            }),
            (true, None) => bail!("BOT_IMAGE_GENERATION=1 requires OPENAI_API_KEY"),
            (false, _) => None,
        };

        let sources = Sources::load_default(get(sources::ENV_SOURCES_PATH).as_deref())?;

        let interval_secs: u64 = num(&get, "BOT_INTERVAL_SECS", 0)?;

        Ok(Self {
            telegram,
            text_providers,
            unsplash,
            image_generation,
            data_dir: PathBuf::from(or("BOT_DATA_DIR", "data")),
            sources,
            select_attempts: num(&get, "BOT_SELECT_ATTEMPTS", DEFAULT_SELECT_ATTEMPTS)?.max(1),
            compose_cycles: num(&get, "BOT_COMPOSE_CYCLES", DEFAULT_COMPOSE_CYCLES)?.max(1),
            shuffle_entries: flag(get("BOT_SHUFFLE_ENTRIES")),
            min_summary_chars: num(&get, "BOT_MIN_SUMMARY_CHARS", DEFAULT_MIN_SUMMARY_CHARS)?,
            min_post_words: num(&get, "BOT_MIN_POST_WORDS", DEFAULT_MIN_POST_WORDS)?,
            min_post_chars: num(&get, "BOT_MIN_POST_CHARS", DEFAULT_MIN_POST_CHARS)?,
            http_timeout: Duration::from_secs(num(&get, "HTTP_TIMEOUT_SECS", 30u64)?.max(1)),
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            dry_run,
        })
    }

    /// Startup diagnostics. Secrets appear only as lengths.
    pub fn log_summary(&self) {
        let providers: Vec<String> = self
            .text_providers
            .iter()
            .map(|p| format!("{}({}, key_len={})", p.name, p.model, p.api_key.len()))
            .collect();
        info!(
            providers = ?providers,
            telegram = self.telegram.as_ref().map(|t| t.chat_id.as_str()).unwrap_or("-"),
            unsplash = self.unsplash.is_some(),
            image_generation = self.image_generation.is_some(),
            feeds = self.sources.feeds.len(),
            data_dir = %self.data_dir.display(),
            dry_run = self.dry_run,
            "config loaded"
        );
    }
}

fn flag(v: Option<String>) -> bool {
    matches!(
        v.unwrap_or_default().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn num<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.parse::<T>().with_context(|| format!("{key}={v:?} is not a valid number")),
        None => Ok(default),
    }
}
