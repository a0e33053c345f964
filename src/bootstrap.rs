// src/bootstrap.rs
//! Turns a `Config` into a ready-to-run `Orchestrator`.
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compose::{ChatCompletionsProvider, PostComposer, TextProvider};
use crate::config::Config;
use crate::feed::{FeedProvider, FeedSampler, FeedSource};
use crate::filter::ContentFilter;
use crate::http;
use crate::image::{ImageResolver, OpenAiImageGenerator, UnsplashSearch};
use crate::notify::{ConsolePublisher, Publisher, TelegramPublisher};
use crate::orchestrator::Orchestrator;
use crate::selector::NewsSelector;
use crate::store::DedupStore;

pub fn build_orchestrator(cfg: &Config) -> Result<Orchestrator> {
    // Store first: an unwritable data dir must stop us before any network call.
    let store = if cfg.dry_run {
        DedupStore::open_dir_scratch(&cfg.data_dir)?
    } else {
        DedupStore::open_dir(&cfg.data_dir)?
    };

    let client = http::client(cfg.http_timeout)?;
    let feeds: Vec<Box<dyn FeedSource>> = cfg
        .sources
        .feeds
        .iter()
        .map(|url| Box::new(FeedProvider::from_url(url, client.clone())) as Box<dyn FeedSource>)
        .collect();
    let filter = ContentFilter::new(
        &cfg.sources.banned_keywords,
        &cfg.sources.interest_keywords,
        cfg.min_summary_chars,
    );
    let selector = NewsSelector::new(FeedSampler::new(feeds), filter, cfg.select_attempts)
        .with_shuffled_entries(cfg.shuffle_entries);

    let mut providers: Vec<Box<dyn TextProvider>> = Vec::with_capacity(cfg.text_providers.len());
    for p in &cfg.text_providers {
        providers.push(Box::new(ChatCompletionsProvider::new(
            &p.name,
            &p.url,
            &p.api_key,
            &p.model,
            cfg.http_timeout,
        )?));
    }
    let composer = PostComposer::new(providers, cfg.min_post_words, cfg.min_post_chars);

    let mut images = ImageResolver::new();
    if let Some(u) = &cfg.unsplash {
        images = images.with_search(Box::new(UnsplashSearch::new(
            &u.url,
            &u.access_key,
            cfg.http_timeout,
        )?));
    }
    if let Some(g) = &cfg.image_generation {
        images = images.with_generator(Box::new(OpenAiImageGenerator::new(
            &g.url,
            &g.api_key,
            &g.model,
            cfg.http_timeout,
        )?));
    }

    let publisher: Box<dyn Publisher> = match (&cfg.telegram, cfg.dry_run) {
        (Some(t), false) => Box::new(
            TelegramPublisher::new(t.token.clone(), t.chat_id.clone(), cfg.http_timeout)?
                .with_api_base(&t.api_base),
        ),
        _ => Box::new(ConsolePublisher),
    };

    Ok(Orchestrator::new(
        selector,
        composer,
        images,
        publisher,
        store,
        StdRng::from_os_rng(),
    )
    .with_compose_cycles(cfg.compose_cycles))
}
