// src/filter.rs
//! Content filter: crude case-insensitive substring rules over title + summary.

use anyhow::Result;

use crate::feed::NewsCandidate;
use crate::store::KeyStore;

pub const DEFAULT_MIN_SUMMARY_CHARS: usize = 40;

/// Why a candidate was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AlreadyPosted,
    Banned(String),
    SummaryTooShort(usize),
    OffTopic,
}

#[derive(Debug, Clone)]
pub struct ContentFilter {
    banned: Vec<String>,
    interests: Vec<String>,
    min_summary_chars: usize,
}

impl ContentFilter {
    /// Keywords are lowercased once. An empty `interests` list disables
    /// interest filtering.
    pub fn new(banned: &[String], interests: &[String], min_summary_chars: usize) -> Self {
        let prep = |v: &[String]| -> Vec<String> {
            v.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            banned: prep(banned),
            interests: prep(interests),
            min_summary_chars,
        }
    }

    /// First matching rejection rule, `None` when the candidate is acceptable.
    pub fn check(&self, c: &NewsCandidate, posted: &dyn KeyStore) -> Result<Option<Rejection>> {
        if posted.contains(&c.link)? {
            return Ok(Some(Rejection::AlreadyPosted));
        }

        let summary = c.summary_text();
        let haystack = format!("{} {}", c.title, summary).to_lowercase();
        if let Some(hit) = self.banned.iter().find(|k| haystack.contains(k.as_str())) {
            return Ok(Some(Rejection::Banned(hit.clone())));
        }

        let len = summary.chars().count();
        if len < self.min_summary_chars {
            return Ok(Some(Rejection::SummaryTooShort(len)));
        }

        if !self.interests.is_empty() && !self.interests.iter().any(|k| haystack.contains(k.as_str())) {
            return Ok(Some(Rejection::OffTopic));
        }

        Ok(None)
    }

    pub fn accept(&self, c: &NewsCandidate, posted: &dyn KeyStore) -> Result<bool> {
        Ok(self.check(c, posted)?.is_none())
    }
}
