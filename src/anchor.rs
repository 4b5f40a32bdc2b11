//! Structural anchor rules.
//!
//! An anchor decides where a fragment is spliced into a document. Rules are
//! resolved against the tag-event scan, never raw substring matching, so
//! occurrence counting cannot silently skip nested or duplicated regions —
//! the failure class that produced most of the old repair scripts.

use crate::error::TransformError;
use crate::scan::{TagEvent, TagKind};

/// A structural location rule.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorRule {
    /// Insertion point at the start of the first occurrence of `marker`.
    BeforeFirst(String),
    /// Insertion point just after the `n`-th occurrence (1-based).
    AfterNth { marker: String, n: usize },
    /// Insertion point at the start of the last occurrence.
    BeforeLast(String),
    /// Insertion point just inside the end of the first `open`…`close`
    /// container, tracking nesting of same-named tags.
    EndOfContainer { open: String, close: String },
    /// Like `BeforeFirst`, but the marker must occur exactly once.
    /// More than one occurrence is an [`TransformError::AmbiguousAnchor`].
    AtUnique(String),
}

impl AnchorRule {
    /// Resolve this rule to a byte offset in `content`.
    ///
    /// `Ok(None)` means the anchor was not found — the transform is
    /// ineligible for this document and skips rather than guesses.
    pub fn resolve(
        &self,
        content: &str,
        events: &[TagEvent],
    ) -> Result<Option<usize>, TransformError> {
        match self {
            AnchorRule::BeforeFirst(marker) => {
                Ok(occurrences(marker, content, events).first().map(|o| o.0))
            }
            AnchorRule::AfterNth { marker, n } => {
                debug_assert!(*n >= 1);
                Ok(occurrences(marker, content, events).get(n - 1).map(|o| o.1))
            }
            AnchorRule::BeforeLast(marker) => {
                Ok(occurrences(marker, content, events).last().map(|o| o.0))
            }
            AnchorRule::EndOfContainer { open, close } => {
                Ok(container_end(open, close, content, events))
            }
            AnchorRule::AtUnique(marker) => {
                let occ = occurrences(marker, content, events);
                match occ.len() {
                    0 => Ok(None),
                    1 => Ok(Some(occ[0].0)),
                    count => Err(TransformError::AmbiguousAnchor {
                        anchor: marker.clone(),
                        count,
                    }),
                }
            }
        }
    }

    /// Human-readable form for reports and `pw list`.
    pub fn describe(&self) -> String {
        match self {
            AnchorRule::BeforeFirst(m) => format!("before first {}", m),
            AnchorRule::AfterNth { marker, n } => format!("after {}th {}", n, marker),
            AnchorRule::BeforeLast(m) => format!("before last {}", m),
            AnchorRule::EndOfContainer { open, .. } => format!("end of {} container", open),
            AnchorRule::AtUnique(m) => format!("at unique {}", m),
        }
    }
}

/// All structural occurrences of a marker, as `(start, end)` byte ranges.
///
/// Marker forms: `</p>` matches close tags, `<head>` matches open tags
/// (attributes ignored), `<!-- x` matches comments by prefix.
fn occurrences(marker: &str, content: &str, events: &[TagEvent]) -> Vec<(usize, usize)> {
    if let Some(text) = marker.strip_prefix("<!--") {
        let want = text.trim_end_matches("-->").trim();
        return events
            .iter()
            .filter(|e| e.kind == TagKind::Comment)
            .filter(|e| comment_text(e.slice(content)).starts_with(want))
            .map(|e| (e.start, e.end))
            .collect();
    }
    if let Some(name) = marker.strip_prefix("</") {
        let name = name.trim_end_matches('>');
        return events
            .iter()
            .filter(|e| e.kind == TagKind::Close && e.name == name)
            .map(|e| (e.start, e.end))
            .collect();
    }
    if let Some(name) = marker.strip_prefix('<') {
        let name = name.trim_end_matches('>');
        return events
            .iter()
            .filter(|e| {
                (e.kind == TagKind::Open || e.kind == TagKind::SelfClose) && e.name == name
            })
            .map(|e| (e.start, e.end))
            .collect();
    }
    // Anchors must be tag-shaped or comment-shaped; anything else matches
    // nothing rather than falling back to substring search.
    Vec::new()
}

fn comment_text(slice: &str) -> String {
    slice
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .to_string()
}

/// Insertion point just before the close tag of the first `open` container,
/// with nesting of same-named tags tracked.
fn container_end(
    open: &str,
    close: &str,
    _content: &str,
    events: &[TagEvent],
) -> Option<usize> {
    let open_name = open.trim_start_matches('<').trim_end_matches('>');
    let close_name = close
        .trim_start_matches("</")
        .trim_end_matches('>');

    let open_idx = events
        .iter()
        .position(|e| e.kind == TagKind::Open && e.name == open_name)?;

    let mut depth = 0usize;
    for e in &events[open_idx + 1..] {
        if e.name == open_name && e.kind == TagKind::Open {
            depth += 1;
        } else if e.name == close_name && e.kind == TagKind::Close {
            if depth == 0 {
                return Some(e.start);
            }
            depth -= 1;
        }
    }
    None
}
