//! Metadata extraction from article HTML.
//!
//! Extraction never fails: the content set is heterogeneous legacy HTML,
//! and halting a whole batch on the first malformed file would make the
//! tool useless. Every field degrades to a documented default instead.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scan::{self, TagEvent, TagKind};
use crate::store::Document;

/// Derived, read-only view of a document. Recomputed from current content
/// on each run, never persisted except through the sidecar index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`. String form so index entries sort lexicographically.
    pub date: String,
    pub category: String,
    pub url: String,
}

/// Extract metadata from a document.
///
/// Fallbacks: title from the slug (separators to spaces, title-cased),
/// empty description, category `General`, date = today.
pub fn extract(doc: &Document) -> Metadata {
    let content = doc.content();
    let events = scan::scan(content).unwrap_or_default();

    let title = title_from_events(content, &events)
        .unwrap_or_else(|| title_from_slug(&doc.slug));
    let description = meta_content(content, &events, "description").unwrap_or_default();
    let category = category_badge(content, &events).unwrap_or_else(|| "General".to_string());
    let date = date_published(content).unwrap_or_else(today);

    Metadata {
        slug: doc.slug.clone(),
        title,
        description,
        date,
        category,
        url: format!("/articles/{}.html", doc.slug),
    }
}

/// Text the ranker scores against: title, description, and h1/h2 headings,
/// lowercased.
pub fn topic_text(doc: &Document) -> String {
    let content = doc.content();
    let events = scan::scan(content).unwrap_or_default();

    let mut parts = Vec::new();
    if let Some(t) = title_from_events(content, &events) {
        parts.push(t);
    }
    if let Some(d) = meta_content(content, &events, "description") {
        parts.push(d);
    }
    for (i, e) in events.iter().enumerate() {
        if e.kind == TagKind::Open && (e.name == "h1" || e.name == "h2") {
            parts.push(scan::element_text(content, &events, i));
        }
    }
    parts.join(" ").to_lowercase()
}

/// Headings that are navigation or boilerplate, never FAQ questions.
const NON_QUESTION_HEADINGS: &[&str] = &[
    "Bottom Line",
    "Keep Reading",
    "Related",
    "Before you go",
    "Stay Ahead",
    "Subscribe",
    "Newsletter",
    "Comments",
    "Share",
    "About",
    "Author",
    "Sources",
    "References",
];

/// A question/answer pair for FAQ structured data.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqPair {
    pub question: String,
    pub answer: String,
}

/// FAQ pairs for a document: each `h2` heading paired with the paragraph
/// that directly follows it (only tags and whitespace in between).
/// Boilerplate headings and answers outside 50..=600 characters are
/// dropped; capped at five pairs.
pub fn faq_pairs(doc: &Document) -> Vec<FaqPair> {
    let content = doc.content();
    let events = match scan::scan(content) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut pairs = Vec::new();
    for (i, e) in events.iter().enumerate() {
        if pairs.len() == 5 {
            break;
        }
        if e.kind != TagKind::Open || e.name != "h2" {
            continue;
        }
        let question = scan::element_text(content, &events, i);
        if question.is_empty() || NON_QUESTION_HEADINGS.iter().any(|h| question.contains(h)) {
            continue;
        }
        let Some(close_idx) = events[i + 1..]
            .iter()
            .position(|c| c.kind == TagKind::Close && c.name == "h2")
            .map(|p| i + 1 + p)
        else {
            continue;
        };
        let Some(p_idx) = events[close_idx + 1..]
            .iter()
            .position(|c| c.kind == TagKind::Open && c.name == "p")
            .map(|p| close_idx + 1 + p)
        else {
            continue;
        };
        if !only_whitespace_between(content, &events[close_idx..=p_idx]) {
            continue;
        }
        let answer = scan::element_text(content, &events, p_idx);
        let len = answer.chars().count();
        if !(50..=600).contains(&len) {
            continue;
        }
        pairs.push(FaqPair {
            question: as_question(&question),
            answer,
        });
    }
    pairs
}

/// True if the text between consecutive events in `span` is all whitespace
/// (tags themselves are allowed).
fn only_whitespace_between(content: &str, span: &[TagEvent]) -> bool {
    span.windows(2)
        .all(|w| content[w[0].end..w[1].start].trim().is_empty())
}

fn as_question(heading: &str) -> String {
    if heading.ends_with('?') {
        heading.to_string()
    } else if heading.split_whitespace().count() <= 3 {
        format!("What is {}?", heading)
    } else {
        format!("{}?", heading)
    }
}

fn title_from_events(content: &str, events: &[TagEvent]) -> Option<String> {
    let idx = events
        .iter()
        .position(|e| e.kind == TagKind::Open && e.name == "title")?;
    let raw = scan::element_text(content, events, idx);
    if raw.is_empty() {
        return None;
    }
    // Drop the "| Site Name" suffix if present.
    let head = raw.split('|').next().unwrap_or(&raw).trim().to_string();
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

fn meta_content(content: &str, events: &[TagEvent], name: &str) -> Option<String> {
    events
        .iter()
        .filter(|e| e.name == "meta")
        .find(|e| scan::attr_value(e.slice(content), "name").as_deref() == Some(name))
        .and_then(|e| scan::attr_value(e.slice(content), "content"))
        .filter(|v| !v.is_empty())
}

/// The "category badge" element: any tag whose class list contains
/// `hero-tag`.
fn category_badge(content: &str, events: &[TagEvent]) -> Option<String> {
    let idx = events.iter().position(|e| {
        e.kind == TagKind::Open
            && scan::attr_value(e.slice(content), "class")
                .map(|c| c.split_whitespace().any(|cls| cls == "hero-tag"))
                .unwrap_or(false)
    })?;
    let text = scan::element_text(content, events, idx);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Publish date from the JSON-LD `datePublished` field. Full ISO timestamps
/// are normalized to `YYYY-MM-DD`.
fn date_published(content: &str) -> Option<String> {
    let key_pos = content.find("\"datePublished\"")?;
    let after = &content[key_pos + "\"datePublished\"".len()..];
    let colon = after.find(':')?;
    let rest = after[colon + 1..].trim_start();
    let rest = rest.strip_prefix('"')?;
    let quote = rest.find('"')?;
    let value = &rest[..quote];
    // `get` rather than slicing: a multibyte character straddling the
    // cut (fullwidth digits, curly quotes) must fall back, not panic.
    let date = value.get(..10)?;
    // Sanity-check the shape before trusting it.
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(date.to_string())
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Load the sidecar index if it exists. The index is a faster metadata
/// source than re-parsing every article; it is regenerated by `pw build`
/// and is not required to be consistent in real time.
pub fn load_index(path: &Path) -> Option<Vec<Metadata>> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
