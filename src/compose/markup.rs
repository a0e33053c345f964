// src/compose/markup.rs
//! Cleanup of model output into the HTML subset the Telegram Bot API accepts.

use once_cell::sync::OnceCell;
use regex::{Captures, Regex};

/// Tags Telegram renders with `parse_mode=HTML`.
const ALLOWED: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "code", "pre", "blockquote",
];

/// Drop a surrounding Markdown fence (```html ... ```).
pub fn strip_code_fences(s: &str) -> String {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t.to_string();
    };
    // skip the language tag line
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim().to_string()
}

fn tag_regex() -> &'static Regex {
    static RE_TAG: OnceCell<Regex> = OnceCell::new();
    RE_TAG.get_or_init(|| Regex::new(r"(?is)<(/?)([a-z][a-z0-9-]*)([^>]*)>").unwrap())
}

/// Rewrite arbitrary HTML-ish model output to Telegram's tag subset. Text
/// between tags is entity-escaped, so a stray `&` or `<` cannot break the
/// Bot API's HTML parser. Unbalanced tags are closed or dropped.
pub fn to_telegram_html(s: &str) -> String {
    static RE_BOLD_MD: OnceCell<Regex> = OnceCell::new();
    static RE_HREF: OnceCell<Regex> = OnceCell::new();
    static RE_NL: OnceCell<Regex> = OnceCell::new();

    let re_bold = RE_BOLD_MD.get_or_init(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
    let re_href = RE_HREF.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap());
    let re_nl = RE_NL.get_or_init(|| Regex::new(r"[ \t]*\n[ \t]*(\n[ \t]*)+").unwrap());

    let src = re_bold.replace_all(s, "<b>$1</b>");
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for caps in tag_regex().captures_iter(&src) {
        let Some(m) = caps.get(0) else { continue };
        push_text(&mut out, &src[last..m.start()]);
        out.push_str(&rewrite_tag(&caps, re_href));
        last = m.end();
    }
    push_text(&mut out, &src[last..]);

    let collapsed = re_nl.replace_all(out.trim(), "\n\n");
    truncate_html(&collapsed, usize::MAX)
}

fn push_text(out: &mut String, raw: &str) {
    let decoded = html_escape::decode_html_entities(raw);
    out.push_str(&html_escape::encode_text(&decoded));
}

fn rewrite_tag(caps: &Captures, re_href: &Regex) -> String {
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    match name.as_str() {
        n if ALLOWED.contains(&n) => {
            if closing {
                format!("</{n}>")
            } else {
                format!("<{n}>")
            }
        }
        "a" if closing => "</a>".to_string(),
        // an anchor without href is dropped; its stray </a> goes in truncate_html
        "a" => match re_href.captures(&caps[3]) {
            Some(h) => {
                let href = html_escape::decode_html_entities(&h[1]);
                format!(
                    "<a href=\"{}\">",
                    html_escape::encode_double_quoted_attribute(&href)
                )
            }
            None => String::new(),
        },
        "br" => "\n".to_string(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            if closing {
                "</b>\n".to_string()
            } else {
                "<b>".to_string()
            }
        }
        "li" if !closing => "• ".to_string(),
        "p" | "div" | "li" | "ul" | "ol" if closing => "\n".to_string(),
        _ => String::new(),
    }
}

enum Piece<'a> {
    Text(&'a str),
    Open(&'a str, String),
    Close(String),
}

/// Cuts sanitized markup to at most `limit` characters, counting the closing
/// tags it has to append. Tags and entities are never split; tags still open
/// at the cut are closed, stray closing tags are dropped.
pub fn truncate_html(s: &str, limit: usize) -> String {
    static RE_UNIT: OnceCell<Regex> = OnceCell::new();
    let re_unit = RE_UNIT.get_or_init(|| Regex::new(r"(?s)&#?[A-Za-z0-9]+;|.").unwrap());

    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in tag_regex().captures_iter(s) {
        let Some(m) = caps.get(0) else { continue };
        pieces.push(Piece::Text(&s[last..m.start()]));
        let name = caps[2].to_ascii_lowercase();
        pieces.push(if caps[1].is_empty() {
            Piece::Open(m.as_str(), name)
        } else {
            Piece::Close(name)
        });
        last = m.end();
    }
    pieces.push(Piece::Text(&s[last..]));

    let closers = |open: &[String]| open.iter().map(|t| t.len() + 3).sum::<usize>();
    let mut out = String::with_capacity(s.len());
    let mut used = 0usize;
    let mut open: Vec<String> = Vec::new();

    'walk: for piece in pieces {
        match piece {
            Piece::Text(t) => {
                for unit in re_unit.find_iter(t).map(|m| m.as_str()) {
                    let n = unit.chars().count();
                    if used.saturating_add(n).saturating_add(closers(&open)) > limit {
                        break 'walk;
                    }
                    out.push_str(unit);
                    used += n;
                }
            }
            Piece::Open(tag, name) => {
                let n = tag.chars().count();
                let need = n + name.len() + 3 + closers(&open);
                if used.saturating_add(need) > limit {
                    break 'walk;
                }
                out.push_str(tag);
                used += n;
                open.push(name);
            }
            Piece::Close(name) => {
                let Some(pos) = open.iter().rposition(|t| *t == name) else {
                    continue;
                };
                // closing an outer tag closes the inner ones first
                while open.len() > pos {
                    if let Some(t) = open.pop() {
                        out.push_str(&format!("</{t}>"));
                        used += t.len() + 3;
                    }
                }
            }
        }
    }

    for t in open.into_iter().rev() {
        out.push_str(&format!("</{t}>"));
    }
    out
}
