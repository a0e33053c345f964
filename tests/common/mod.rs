// tests/common/mod.rs
// Mock providers shared by the integration tests. No network anywhere.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use newsroom_bot::compose::TextProvider;
use newsroom_bot::feed::{parse_feed, FeedSource, ParsedFeed};
use newsroom_bot::image::{ImageGenerator, ImageSearch};
use newsroom_bot::notify::Publisher;

/// RSS document with one item per `(link, summary)` pair.
pub fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .enumerate()
        .map(|(i, (link, summary))| {
            format!(
                "<item><title>Item {i}</title><link>{link}</link>\
                 <description><![CDATA[{summary}]]></description></item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Test Feed</title>{body}</channel></rss>"#)
}

/// Summary of exactly `n` plain characters.
pub fn summary_of(n: usize) -> String {
    "a".repeat(n)
}

/// Long enough to pass the composer's default minimums.
pub const GOOD_POST: &str = "<b>Новость дня</b>\nСегодня вышла новая версия редактора, \
    и в ней много полезного для начинающих. Разработчики ускорили рендер, \
    упростили интерфейс и добавили подсказки. Что вы думаете об этом обновлении? \
    <a href=\"https://x/1\">Источник</a>";

/// Feed that counts fetches.
pub struct CountingFeed {
    pub xml: String,
    pub calls: Arc<AtomicUsize>,
}

impl CountingFeed {
    pub fn new(xml: String) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                xml,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl FeedSource for CountingFeed {
    async fn fetch(&self) -> Result<ParsedFeed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_feed(&self.xml)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Text provider answering from a script; `Err` entries simulate failures.
/// Repeats the last entry once the script runs out.
pub struct ScriptedProvider {
    pub name: String,
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(name: &str, script: Vec<Result<&str, &str>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        (
            Self {
                name: name.to_string(),
                script: Mutex::new(script),
                last: Mutex::new(None),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(a) => {
                *self.last.lock().unwrap() = Some(a.clone());
                a
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script empty".into())),
        };
        answer.map_err(|e| anyhow!(e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct StaticSearch {
    pub urls: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl StaticSearch {
    pub fn new(urls: &[&str]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                urls: urls.iter().map(|s| s.to_string()).collect(),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl ImageSearch for StaticSearch {
    async fn search(&self, _query: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.urls.clone())
    }

    fn name(&self) -> &str {
        "static-search"
    }
}

pub struct StaticGenerator(pub String);

#[async_trait]
impl ImageGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "static-generator"
    }
}

pub type Sent = Arc<Mutex<Vec<(String, Option<String>)>>>;

/// Publisher that remembers every call and optionally fails.
pub struct RecordingPublisher {
    pub sent: Sent,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn new(fail: bool) -> (Self, Sent) {
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                sent: sent.clone(),
                fail,
            },
            sent,
        )
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str, image: Option<&str>) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), image.map(str::to_string)));
        if self.fail {
            Err(anyhow!("HTTP 400 Bad Request: can't parse entities"))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}
