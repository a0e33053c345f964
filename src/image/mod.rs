// src/image/mod.rs
//! Image resolver. Strategy order: image embedded in the entry, then image
//! search, then image generation. Every URL handed out is marked used first.

pub mod providers;

use anyhow::Result;
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::feed::NewsCandidate;
use crate::store::KeyStore;
pub use providers::{ImageGenerator, ImageSearch, OpenAiImageGenerator, UnsplashSearch};

const SEARCH_SUFFIXES: &[&str] = &["", " concept", " art", " idea", " tech", " future", " workspace"];

/// `src` of every `<img>` tag, in document order.
pub fn embedded_images(html: &str) -> Vec<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
    });
    re.captures_iter(html)
        .map(|c| html_escape::decode_html_entities(c[1].trim()).to_string())
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .collect()
}

/// Search keyword from crude substring checks on the summary.
pub fn search_topic(summary: &str) -> &'static str {
    static RE_AI: OnceCell<Regex> = OnceCell::new();
    let re_ai = RE_AI.get_or_init(|| Regex::new(r"\bai\b").unwrap());

    let s = summary.to_lowercase();
    if s.contains("3d") {
        "3D modeling"
    } else if re_ai.is_match(&s) || s.contains("нейросет") || s.contains("искусственн") {
        "artificial intelligence"
    } else {
        "programming"
    }
}

/// Query variants for one topic.
pub fn search_terms(topic: &str) -> Vec<String> {
    SEARCH_SUFFIXES.iter().map(|s| format!("{topic}{s}")).collect()
}

#[derive(Default)]
pub struct ImageResolver {
    search: Option<Box<dyn ImageSearch>>,
    generator: Option<Box<dyn ImageGenerator>>,
}

impl ImageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, s: Box<dyn ImageSearch>) -> Self {
        self.search = Some(s);
        self
    }

    pub fn with_generator(mut self, g: Box<dyn ImageGenerator>) -> Self {
        self.generator = Some(g);
        self
    }

    /// An unused image URL for the candidate, already recorded in `used`.
    /// `Ok(None)` means publish text-only.
    pub async fn resolve(
        &self,
        c: &NewsCandidate,
        used: &mut dyn KeyStore,
        rng: &mut StdRng,
    ) -> Result<Option<String>> {
        // 1) Image shipped with the entry
        let embedded = c.image.iter().cloned().chain(embedded_images(&c.summary));
        for url in embedded {
            if claim(&url, used)? {
                tracing::info!(%url, strategy = "embedded", "image resolved");
                return Ok(Some(url));
            }
        }

        // 2) Search
        if let Some(search) = &self.search {
            let mut terms = search_terms(search_topic(&c.summary_text()));
            terms.shuffle(rng);
            for term in terms {
                let mut urls = match search.search(&term).await {
                    Ok(urls) => urls,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = search.name(), %term, "image search failed");
                        continue;
                    }
                };
                urls.shuffle(rng);
                for url in urls {
                    if claim(&url, used)? {
                        tracing::info!(%url, %term, strategy = "search", "image resolved");
                        return Ok(Some(url));
                    }
                }
            }
        }

        // 3) Generation
        if let Some(generator) = &self.generator {
            let prompt = format!(
                "Bright, clean illustration for a tech news post, no text on the image: {}",
                c.title
            );
            match generator.generate(&prompt).await {
                Ok(url) => {
                    if claim(&url, used)? {
                        tracing::info!(%url, strategy = "generation", "image resolved");
                        return Ok(Some(url));
                    }
                }
                Err(e) => tracing::warn!(error = ?e, provider = generator.name(), "image generation failed"),
            }
        }

        tracing::info!(link = %c.link, "no unused image found");
        Ok(None)
    }
}

/// Marks `url` used unless it already is. `true` if this call claimed it.
fn claim(url: &str, used: &mut dyn KeyStore) -> Result<bool> {
    if used.contains(url)? {
        return Ok(false);
    }
    used.add(url)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn img_tags_are_extracted_and_unescaped() {
        let html = r#"<p>x</p><IMG alt="a" SRC="https://img/a.png?x=1&amp;y=2"><img src='/relative.png'><img src="https://img/b.jpg"/>"#;
        assert_eq!(
            embedded_images(html),
            vec!["https://img/a.png?x=1&y=2".to_string(), "https://img/b.jpg".to_string()]
        );
    }

    #[test]
    fn topic_from_summary_keywords() {
        assert_eq!(search_topic("New 3D printer"), "3D modeling");
        assert_eq!(search_topic("OpenAI ships an AI model"), "artificial intelligence");
        assert_eq!(search_topic("Нейросети учатся"), "artificial intelligence");
        assert_eq!(search_topic("said again"), "programming");
    }

    #[test]
    fn terms_cover_all_variants() {
        let t = search_terms("programming");
        assert_eq!(t.len(), 7);
        assert_eq!(t[0], "programming");
        assert!(t.contains(&"programming workspace".to_string()));
    }
}
