// src/orchestrator.rs
//! # Run orchestration
//! One run: SELECT → COMPOSE → RESOLVE_IMAGE → PUBLISH → RECORD.
//!
//! Policy:
//! - no candidate ends the run quietly (`NoCandidate`);
//! - a rejected composition goes back to SELECT with the failed link
//!   excluded, at most `compose_cycles` times (`GaveUp`);
//! - the link is recorded only after the publisher confirmed delivery;
//! - a resolved image URL is recorded at resolve time, even if publishing
//!   fails afterwards.

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use std::collections::HashSet;

use crate::compose::{ComposedPost, PostComposer};
use crate::feed::NewsCandidate;
use crate::image::ImageResolver;
use crate::notify::Publisher;
use crate::selector::NewsSelector;
use crate::store::DedupStore;

pub const DEFAULT_COMPOSE_CYCLES: usize = 5;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bot_runs_total", "Orchestrator runs started.");
        describe_counter!("bot_posts_total", "Posts confirmed by the publisher.");
        describe_counter!(
            "bot_publish_failures_total",
            "Publish calls that did not succeed."
        );
        describe_counter!("bot_feed_errors_total", "Feed fetch/parse errors.");
        describe_counter!(
            "bot_provider_failures_total",
            "Text provider calls without usable content."
        );
    });
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        link: String,
        image: Option<String>,
        provider: String,
    },
    /// Nothing acceptable in the feeds this time.
    NoCandidate,
    /// Every composition attempt was rejected.
    GaveUp { cycles: usize },
    /// The publisher refused the post; the link stays unrecorded.
    PublishFailed { link: String, error: String },
}

enum Step {
    Select,
    Compose(NewsCandidate),
    ResolveImage(ComposedPost),
    Publish(ComposedPost, Option<String>),
    Record(ComposedPost, Option<String>),
}

pub struct Orchestrator {
    selector: NewsSelector,
    composer: PostComposer,
    images: ImageResolver,
    publisher: Box<dyn Publisher>,
    store: DedupStore,
    compose_cycles: usize,
    rng: StdRng,
}

impl Orchestrator {
    pub fn new(
        selector: NewsSelector,
        composer: PostComposer,
        images: ImageResolver,
        publisher: Box<dyn Publisher>,
        store: DedupStore,
        rng: StdRng,
    ) -> Self {
        Self {
            selector,
            composer,
            images,
            publisher,
            store,
            compose_cycles: DEFAULT_COMPOSE_CYCLES,
            rng,
        }
    }

    pub fn with_compose_cycles(mut self, cycles: usize) -> Self {
        self.compose_cycles = cycles.max(1);
        self
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Execute one run to completion. Errors are store I/O failures only;
    /// every upstream failure ends in a `RunOutcome`.
    pub async fn run_once(&mut self) -> Result<RunOutcome> {
        ensure_metrics_described();
        counter!("bot_runs_total").increment(1);

        let mut excluded: HashSet<String> = HashSet::new();
        let mut cycles = 0usize;
        let mut step = Step::Select;

        loop {
            step = match step {
                Step::Select => {
                    let picked = self
                        .selector
                        .select(&*self.store.links, &excluded, &mut self.rng)
                        .await?;
                    match picked {
                        Some(c) => {
                            cycles += 1;
                            tracing::info!(cycle = cycles, title = %c.title, "news picked");
                            Step::Compose(c)
                        }
                        None => return Ok(RunOutcome::NoCandidate),
                    }
                }

                Step::Compose(c) => match self.composer.compose(&c, &mut self.rng).await {
                    Some(post) => Step::ResolveImage(post),
                    None if cycles >= self.compose_cycles => {
                        tracing::warn!(cycles, "giving up, no acceptable post this run");
                        return Ok(RunOutcome::GaveUp { cycles });
                    }
                    None => {
                        excluded.insert(c.link);
                        Step::Select
                    }
                },

                Step::ResolveImage(post) => {
                    let image = self
                        .images
                        .resolve(&post.candidate, &mut *self.store.images, &mut self.rng)
                        .await?;
                    Step::Publish(post, image)
                }

                Step::Publish(post, image) => {
                    match self.publisher.publish(&post.text, image.as_deref()).await {
                        Ok(()) => Step::Record(post, image),
                        Err(e) => {
                            tracing::error!(
                                error = ?e,
                                publisher = self.publisher.name(),
                                link = %post.candidate.link,
                                "publish failed, link not recorded"
                            );
                            counter!("bot_publish_failures_total").increment(1);
                            return Ok(RunOutcome::PublishFailed {
                                link: post.candidate.link,
                                error: format!("{e:#}"),
                            });
                        }
                    }
                }

                Step::Record(post, image) => {
                    let link = post.candidate.link;
                    self.store.links.add(&link)?;
                    counter!("bot_posts_total").increment(1);
                    tracing::info!(%link, image = image.as_deref().unwrap_or("-"), "post published");
                    return Ok(RunOutcome::Published {
                        link,
                        image,
                        provider: post.provider,
                    });
                }
            };
        }
    }
}
