// tests/feed_fixtures.rs
// Real-shaped RSS/Atom documents through parse + sampling.
mod common;

use rand::{rngs::StdRng, SeedableRng};

use newsroom_bot::feed::{parse_feed, FeedProvider, FeedSampler, FeedSource};

const RSS: &str = include_str!("fixtures/tech_rss.xml");
const ATOM: &str = include_str!("fixtures/atom.xml");

#[test]
fn rss_fixture_parses_every_item() {
    let feed = parse_feed(RSS).expect("rss fixture parses");
    assert_eq!(feed.title.as_deref(), Some("Tech & Dev Daily"));
    assert_eq!(feed.entries.len(), 5);

    let blender = &feed.entries[0];
    assert_eq!(blender.link, "https://news.example.org/blender-42");
    assert!(blender.summary.contains(r#"<img src="https://cdn.example.org/blender.png">"#));
    assert_eq!(blender.published_at.map(|d| d.timestamp()), Some(1_749_528_000));
    assert!(blender.image.is_none());

    let rust = &feed.entries[1];
    assert_eq!(rust.link, "https://news.example.org/rust-180");
    assert_eq!(rust.image.as_deref(), Some("https://cdn.example.org/rust.jpg"));

    let godot = &feed.entries[2];
    assert_eq!(godot.image.as_deref(), Some("https://cdn.example.org/godot.jpg"));
    assert!(godot.summary.starts_with("The open-source engine"));
}

#[test]
fn atom_fixture_parses_links_and_dates() {
    let feed = parse_feed(ATOM).expect("atom fixture parses");
    assert_eq!(feed.title.as_deref(), Some("Hacker Digest"));
    assert_eq!(feed.entries.len(), 3);

    assert_eq!(feed.entries[0].link, "https://digest.example.com/posts/1");
    assert_eq!(feed.entries[0].published_at.map(|d| d.timestamp()), Some(1_749_540_600));
    assert!(feed.entries[0].summary.starts_with("<p>A new AI model"));

    // No summary: content is used; only `updated` is present.
    assert_eq!(feed.entries[1].link, "https://digest.example.com/posts/2");
    assert!(feed.entries[1].summary.starts_with("The studio published"));
    assert_eq!(feed.entries[1].published_at.map(|d| d.timestamp()), Some(1_749_463_200));

    // xhtml body: the inner markup becomes the summary
    let zig = &feed.entries[2];
    assert!(zig.summary.starts_with(r#"<div xmlns="http://www.w3.org/1999/xhtml">"#));
    assert!(zig.summary.contains("<b>1.0</b>"));
}

#[tokio::test]
async fn sampler_drops_unusable_entries_and_labels_by_feed_title() {
    let sources: Vec<Box<dyn FeedSource>> = vec![Box::new(FeedProvider::from_fixture("fixture", RSS))];
    let sampler = FeedSampler::new(sources);
    let mut rng = StdRng::seed_from_u64(7);

    let got = sampler.sample(&mut rng).await;
    // The untitled entry is gone; the short one is still a candidate (the
    // filter rejects it later).
    let links: Vec<&str> = got.iter().map(|c| c.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://news.example.org/blender-42",
            "https://news.example.org/rust-180",
            "https://news.example.org/godot-43",
            "https://news.example.org/short",
        ]
    );
    assert!(got.iter().all(|c| c.source == "Tech & Dev Daily"));
}

#[tokio::test]
async fn broken_feed_yields_nothing() {
    let (feed, calls) = common::CountingFeed::new("<html><body>503".into());
    let sampler = FeedSampler::new(vec![Box::new(feed)]);
    let mut rng = StdRng::seed_from_u64(1);

    assert!(sampler.sample(&mut rng).await.is_empty());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}
