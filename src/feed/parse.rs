// src/feed/parse.rs
//! RSS 2.0 and Atom documents into `ParsedFeed`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use std::collections::HashMap;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::types::{FeedEntry, ParsedFeed};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Text>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(default)]
    enclosure: Vec<Enclosure>,
    /// `<media:content>`; elements are matched by local name.
    #[serde(rename = "content", default)]
    media: Vec<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
}

impl Enclosure {
    fn image_url(&self) -> Option<&str> {
        let is_image = self.mime.as_deref().is_some_and(|m| m.starts_with("image/"))
            || self.medium.as_deref() == Some("image");
        self.url.as_deref().filter(|u| is_image && !u.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<Text>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<Text>,
    content: Option<Text>,
    updated: Option<String>,
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element text that may carry attributes (`<title type="html">`). Child
/// elements are invisible here; see `atom_xhtml_bodies`.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Local name of the document's root element.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                return Some(name);
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Parse an RSS 2.0 or Atom document.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let xml = scrub_html_entities_for_xml(xml);
    match root_element(&xml).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&xml).context("parsing rss xml")?;
            Ok(from_rss(rss))
        }
        Some("feed") => {
            let atom: AtomFeed = from_str(&xml).context("parsing atom xml")?;
            let xhtml = atom_xhtml_bodies(&xml);
            Ok(from_atom(atom, &xhtml))
        }
        Some(other) => Err(anyhow!("unsupported feed root element <{other}>")),
        None => Err(anyhow!("document has no root element")),
    }
}

fn from_rss(rss: Rss) -> ParsedFeed {
    let entries = rss
        .channel
        .items
        .into_iter()
        .map(|it| {
            let image = it
                .enclosure
                .iter()
                .chain(it.media.iter())
                .find_map(Enclosure::image_url)
                .map(str::to_string);
            // Some feeds only carry a permalink guid.
            let link = it
                .link
                .filter(|l| !l.trim().is_empty())
                .or_else(|| it.guid.map(|g| g.value).filter(|g| g.starts_with("http")))
                .unwrap_or_default();
            FeedEntry {
                title: it.title.unwrap_or_default(),
                link,
                summary: it.description.unwrap_or_default(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
                image,
            }
        })
        .collect();
    ParsedFeed {
        title: rss.channel.title.filter(|t| !t.trim().is_empty()),
        entries,
    }
}

/// Which Atom text construct an xhtml body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Body {
    Summary,
    Content,
}

fn is_xhtml(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"type" && a.value.as_ref() == b"xhtml")
}

/// Inner markup of `type="xhtml"` summaries and contents, keyed by entry
/// position. serde only sees their text nodes, which are usually empty.
fn atom_xhtml_bodies(xml: &str) -> HashMap<(usize, Body), String> {
    let mut reader = Reader::from_str(xml);
    let mut out = HashMap::new();
    let mut current: Option<usize> = None;
    let mut seen = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let body = match e.local_name().as_ref() {
                    b"entry" => {
                        current = Some(seen);
                        seen += 1;
                        continue;
                    }
                    b"summary" => Body::Summary,
                    b"content" => Body::Content,
                    _ => continue,
                };
                let Some(idx) = current.filter(|_| is_xhtml(&e)) else {
                    continue;
                };
                let end = e.name().as_ref().to_vec();
                match reader.read_text(QName(&end)) {
                    Ok(inner) => {
                        out.insert((idx, body), inner.trim().to_string());
                    }
                    Err(_) => break,
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"entry" => current = None,
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

fn from_atom(atom: AtomFeed, xhtml: &HashMap<(usize, Body), String>) -> ParsedFeed {
    let body = |idx: usize, kind: Body, text: Option<Text>| {
        text.map(|t| t.value)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| xhtml.get(&(idx, kind)).cloned())
            .filter(|s| !s.trim().is_empty())
    };
    let entries = atom
        .entries
        .into_iter()
        .enumerate()
        .map(|(idx, e)| {
            let link = e
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                .or_else(|| e.links.first())
                .and_then(|l| l.href.clone())
                .unwrap_or_default();
            let summary = body(idx, Body::Summary, e.summary)
                .or_else(|| body(idx, Body::Content, e.content))
                .unwrap_or_default();
            let published_at = e
                .published
                .as_deref()
                .or(e.updated.as_deref())
                .and_then(parse_rfc3339);
            FeedEntry {
                title: e.title.map(|t| t.value).unwrap_or_default(),
                link,
                summary,
                published_at,
                image: None,
            }
        })
        .collect();
    ParsedFeed {
        title: atom.title.map(|t| t.value).filter(|t| !t.trim().is_empty()),
        entries,
    }
}

/// HTML entities that are not valid XML but show up in real feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&laquo;", "\"")
        .replace("&raquo;", "\"")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
