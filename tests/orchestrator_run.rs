// tests/orchestrator_run.rs
// Whole runs against mocks: select → compose → image → publish → record.
mod common;

use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::Ordering;

use common::{rss, summary_of, CountingFeed, RecordingPublisher, ScriptedProvider, StaticGenerator, GOOD_POST};
use newsroom_bot::compose::{PostComposer, DEFAULT_MIN_POST_CHARS, DEFAULT_MIN_POST_WORDS};
use newsroom_bot::feed::FeedSampler;
use newsroom_bot::filter::{ContentFilter, DEFAULT_MIN_SUMMARY_CHARS};
use newsroom_bot::image::ImageResolver;
use newsroom_bot::selector::NewsSelector;
use newsroom_bot::{DedupStore, KeyStore, Orchestrator, RunOutcome};

struct Setup {
    xml: String,
    answers: Vec<Result<&'static str, &'static str>>,
    publish_fails: bool,
    generator: Option<&'static str>,
}

impl Setup {
    fn new(xml: String) -> Self {
        Self {
            xml,
            answers: vec![Ok(GOOD_POST)],
            publish_fails: false,
            generator: None,
        }
    }

    fn build(self) -> (Orchestrator, common::Sent, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let (feed, _) = CountingFeed::new(self.xml);
        let selector = NewsSelector::new(
            FeedSampler::new(vec![Box::new(feed)]),
            ContentFilter::new(&[], &[], DEFAULT_MIN_SUMMARY_CHARS),
            3,
        );
        let (provider, provider_calls) = ScriptedProvider::new("primary", self.answers);
        let composer = PostComposer::new(
            vec![Box::new(provider)],
            DEFAULT_MIN_POST_WORDS,
            DEFAULT_MIN_POST_CHARS,
        );
        let mut images = ImageResolver::new();
        if let Some(url) = self.generator {
            images = images.with_generator(Box::new(StaticGenerator(url.into())));
        }
        let (publisher, sent) = RecordingPublisher::new(self.publish_fails);
        let orch = Orchestrator::new(
            selector,
            composer,
            images,
            Box::new(publisher),
            DedupStore::in_memory(),
            StdRng::seed_from_u64(11),
        );
        (orch, sent, provider_calls)
    }
}

#[tokio::test]
async fn published_run_records_link_and_image() {
    let summary = format!(r#"<img src="https://img/a.png">{}"#, summary_of(100));
    let (mut orch, sent, _) = Setup::new(rss(&[("https://x/1", &summary)])).build();

    let outcome = orch.run_once().await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Published {
            link: "https://x/1".into(),
            image: Some("https://img/a.png".into()),
            provider: "primary".into(),
        }
    );
    assert!(orch.store().links.contains("https://x/1").unwrap());
    assert!(orch.store().images.contains("https://img/a.png").unwrap());

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.as_deref(), Some("https://img/a.png"));

    drop(sent);
    // same feed again: nothing new
    assert_eq!(orch.run_once().await.unwrap(), RunOutcome::NoCandidate);
}

#[tokio::test]
async fn text_only_post_when_no_image_is_available() {
    let summary = summary_of(100);
    let (mut orch, sent, _) = Setup::new(rss(&[("https://x/1", &summary)])).build();

    match orch.run_once().await.unwrap() {
        RunOutcome::Published { image, .. } => assert_eq!(image, None),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(sent.lock().unwrap()[0].1, None);
}

#[tokio::test]
async fn failed_publish_leaves_link_unrecorded() {
    let summary = summary_of(100);
    let mut setup = Setup::new(rss(&[("https://x/1", &summary)]));
    setup.publish_fails = true;
    setup.generator = Some("https://gen/1.png");
    let (mut orch, sent, _) = setup.build();

    match orch.run_once().await.unwrap() {
        RunOutcome::PublishFailed { link, error } => {
            assert_eq!(link, "https://x/1");
            assert!(error.contains("400"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!orch.store().links.contains("https://x/1").unwrap());
    // the image was claimed before publishing
    assert!(orch.store().images.contains("https://gen/1.png").unwrap());
    assert_eq!(sent.lock().unwrap().len(), 1);

    // next run retries the same news
    match orch.run_once().await.unwrap() {
        RunOutcome::PublishFailed { link, .. } => assert_eq!(link, "https://x/1"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn empty_feed_ends_without_candidate() {
    let (mut orch, sent, provider_calls) = Setup::new(rss(&[])).build();

    assert_eq!(orch.run_once().await.unwrap(), RunOutcome::NoCandidate);
    assert!(sent.lock().unwrap().is_empty());
    assert_eq!(provider_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_posts_reselect_then_give_up() {
    let long = summary_of(100);
    let links: Vec<String> = (1..=8).map(|i| format!("https://x/{i}")).collect();
    let items: Vec<(&str, &str)> = links.iter().map(|l| (l.as_str(), long.as_str())).collect();
    let mut setup = Setup::new(rss(&items));
    setup.answers = vec![Ok("Слишком коротко.")];
    let (mut orch, sent, provider_calls) = setup.build();

    assert_eq!(orch.run_once().await.unwrap(), RunOutcome::GaveUp { cycles: 5 });
    assert_eq!(provider_calls.load(Ordering::SeqCst), 5);
    assert!(sent.lock().unwrap().is_empty());
    for l in &links {
        assert!(!orch.store().links.contains(l).unwrap());
    }
}

#[tokio::test]
async fn rejected_post_moves_on_to_the_next_item() {
    let long = summary_of(100);
    let mut setup = Setup::new(rss(&[("https://x/1", &long), ("https://x/2", &long)]));
    setup.answers = vec![Ok("Слишком коротко."), Ok(GOOD_POST)];
    let (mut orch, _, provider_calls) = setup.build();

    match orch.run_once().await.unwrap() {
        RunOutcome::Published { link, .. } => assert_eq!(link, "https://x/2"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(provider_calls.load(Ordering::SeqCst), 2);
    assert!(!orch.store().links.contains("https://x/1").unwrap());
}
