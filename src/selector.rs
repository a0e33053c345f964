// src/selector.rs
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::feed::{FeedSampler, NewsCandidate};
use crate::filter::ContentFilter;
use crate::store::KeyStore;

pub const DEFAULT_SELECT_ATTEMPTS: usize = 10;

/// Produces at most one unseen, acceptable item per call.
pub struct NewsSelector {
    sampler: FeedSampler,
    filter: ContentFilter,
    max_attempts: usize,
    shuffle_entries: bool,
}

impl NewsSelector {
    pub fn new(sampler: FeedSampler, filter: ContentFilter, max_attempts: usize) -> Self {
        Self {
            sampler,
            filter,
            max_attempts,
            shuffle_entries: false,
        }
    }

    /// Scan each sampled feed in random order instead of feed order.
    pub fn with_shuffled_entries(mut self, on: bool) -> Self {
        self.shuffle_entries = on;
        self
    }

    /// Samples up to `max_attempts` feeds. `Ok(None)` means nothing to do this
    /// run; errors only come from the posted-links store.
    pub async fn select(
        &self,
        posted: &dyn KeyStore,
        exclude: &HashSet<String>,
        rng: &mut StdRng,
    ) -> Result<Option<NewsCandidate>> {
        for attempt in 1..=self.max_attempts {
            let mut candidates = self.sampler.sample(rng).await;
            if self.shuffle_entries {
                candidates.shuffle(rng);
            }

            for c in candidates {
                if exclude.contains(&c.link) {
                    continue;
                }
                match self.filter.check(&c, posted)? {
                    None => {
                        tracing::info!(attempt, link = %c.link, source = %c.source, "candidate selected");
                        return Ok(Some(c));
                    }
                    Some(why) => {
                        tracing::debug!(attempt, link = %c.link, reason = ?why, "candidate rejected");
                    }
                }
            }
        }

        tracing::info!(attempts = self.max_attempts, "no acceptable candidate");
        Ok(None)
    }
}
