//! Applies fragments to documents and reports outcomes.
//!
//! The runner owns the safety rules the old scripts lacked: the
//! idempotency-marker short-circuit, structural anchor resolution, the
//! paragraph-count invariant, and the guarantee that a failed transform
//! leaves the document untouched.

use std::fmt;

use crate::error::TransformError;
use crate::fragment::{Fragment, FragmentRegistry, RenderContext};
use crate::meta::Metadata;
use crate::scan::{self, TagKind};
use crate::store::Document;

/// Outcome of applying one transform to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    SkippedAlreadyPresent,
    SkippedIneligible,
    Error,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::SkippedAlreadyPresent => write!(f, "skipped (already present)"),
            Outcome::SkippedIneligible => write!(f, "skipped (ineligible)"),
            Outcome::Error => write!(f, "error"),
        }
    }
}

/// Audit entry for one transform application. Lives only for the duration
/// of a run; the batch summary aggregates these.
#[derive(Debug, Clone)]
pub struct TransformRecord {
    pub transform: String,
    pub slug: String,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

impl TransformRecord {
    fn new(transform: &str, slug: &str, outcome: Outcome, detail: Option<String>) -> Self {
        Self {
            transform: transform.to_string(),
            slug: slug.to_string(),
            outcome,
            detail,
        }
    }
}

pub struct TransformRunner<'a> {
    registry: &'a FragmentRegistry,
}

impl<'a> TransformRunner<'a> {
    pub fn new(registry: &'a FragmentRegistry) -> Self {
        Self { registry }
    }

    /// Apply one named transform to a document.
    ///
    /// With `force`, the idempotency marker is ignored and any existing
    /// sentinel-delimited region owned by the fragment is stripped before
    /// re-inserting, so regeneratable blocks are replaced instead of
    /// stacked.
    pub fn apply(
        &self,
        doc: &mut Document,
        name: &str,
        meta: &Metadata,
        ctx: &RenderContext,
        force: bool,
    ) -> TransformRecord {
        let fragment = match self.registry.get(name) {
            Some(f) => f,
            None => {
                return TransformRecord::new(
                    name,
                    &doc.slug,
                    Outcome::Error,
                    Some(format!("unknown transform: {}", name)),
                )
            }
        };

        // Cheap short-circuit before any structural work.
        if !force && doc.content().contains(&fragment.marker) {
            return TransformRecord::new(name, &doc.slug, Outcome::SkippedAlreadyPresent, None);
        }

        match self.apply_inner(doc, fragment, meta, ctx, force) {
            Ok(Some(())) => TransformRecord::new(name, &doc.slug, Outcome::Applied, None),
            Ok(None) => TransformRecord::new(
                name,
                &doc.slug,
                Outcome::SkippedIneligible,
                Some(format!("anchor not found: {}", fragment.anchor.describe())),
            ),
            Err(e) => TransformRecord::new(name, &doc.slug, Outcome::Error, Some(e.to_string())),
        }
    }

    /// Worker over a scratch copy; the document is only updated on success.
    fn apply_inner(
        &self,
        doc: &mut Document,
        fragment: &Fragment,
        meta: &Metadata,
        ctx: &RenderContext,
        force: bool,
    ) -> Result<Option<()>, TransformError> {
        let mut working = doc.content().to_string();

        if force {
            if let Some((begin, end)) = fragment.region {
                working = strip_regions(&working, begin, end)?;
            }
        }

        let events = scan::scan(&working)?;
        let baseline_paragraphs = scan::paragraph_count(&events);

        let pos = match fragment.anchor.resolve(&working, &events)? {
            Some(p) => p,
            None => return Ok(None),
        };

        let rendered = match self.registry.render(fragment.name, meta, ctx) {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut next = String::with_capacity(working.len() + rendered.len());
        next.push_str(&working[..pos]);
        next.push_str(&rendered);
        next.push_str(&working[pos..]);

        // Splicing must never lose structural content. Anything else means
        // the anchor landed somewhere it should not have.
        let after_events = scan::scan(&next)?;
        if scan::paragraph_count(&after_events) < baseline_paragraphs {
            return Err(TransformError::ContentLoss(format!(
                "paragraph count dropped while applying {}",
                fragment.name
            )));
        }

        doc.set_content(next);
        Ok(Some(()))
    }
}

/// Remove every sentinel-delimited region `begin … end` from the content.
///
/// Regions are located via comment events from the structural scan, so a
/// stray sentinel string inside a script does not confuse the cut. Handles
/// the historical duplicate-block damage by removing all pairs, not just
/// the first.
pub fn strip_regions(content: &str, begin: &str, end: &str) -> Result<String, TransformError> {
    let begin_text = begin.trim_start_matches("<!--").trim();
    let end_text = end.trim_start_matches("<!--").trim_end_matches("-->").trim();

    let mut out = content.to_string();
    loop {
        let events = scan::scan(&out)?;
        let begin_ev = events.iter().find(|e| {
            e.kind == TagKind::Comment && comment_text(e.slice(&out)).starts_with(begin_text)
        });
        let Some(b) = begin_ev else { break };
        let end_ev = events.iter().find(|e| {
            e.start > b.start
                && e.kind == TagKind::Comment
                && comment_text(e.slice(&out)).starts_with(end_text)
        });
        let Some(e) = end_ev else {
            return Err(TransformError::MalformedDocument(format!(
                "region begin sentinel `{}` has no matching end",
                begin_text
            )));
        };
        let mut cut_start = b.start;
        let mut cut_end = e.end;
        // Swallow the surrounding newlines so repeated strip/insert cycles
        // do not accumulate blank lines.
        if out[..cut_start].ends_with('\n') {
            cut_start -= 1;
        }
        if out[cut_end..].starts_with('\n') {
            cut_end += 1;
        }
        out.replace_range(cut_start..cut_end, "");
    }
    Ok(out)
}

fn comment_text(slice: &str) -> String {
    slice
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .to_string()
}
