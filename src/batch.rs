//! Batch orchestration for `pw apply`.
//!
//! One document at a time: load, transform, save, next. The metadata index
//! and topic vectors are built once before any mutation pass begins, so
//! ranking is unaffected by in-flight edits. Saves are per-document atomic
//! writes, so an aborted run leaves saved documents intact and unsaved
//! ones untouched.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::config::Config;
use crate::fragment::{FragmentRegistry, RenderContext};
use crate::meta::{self, Metadata};
use crate::related::{Ranker, RelatedLink};
use crate::store::DocumentStore;
use crate::transform::{Outcome, TransformRecord, TransformRunner};

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Transform name, or `all` for the full built-in sequence.
    pub transform: String,
    /// Extra glob narrowing the target set.
    pub glob: Option<String>,
    /// Report what would change without writing anything.
    pub dry_run: bool,
    /// Ignore idempotency markers; replace regeneratable regions.
    pub force: bool,
    /// Cap on the number of documents processed.
    pub limit: Option<usize>,
}

/// Aggregated outcome counts for a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub records: Vec<TransformRecord>,
    pub files_written: usize,
}

impl RunSummary {
    pub fn count(&self, outcome: &Outcome) -> usize {
        self.records.iter().filter(|r| &r.outcome == outcome).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(&Outcome::Error) > 0
    }
}

pub fn run_apply(config: &Config, opts: &ApplyOptions) -> Result<RunSummary> {
    let registry = FragmentRegistry::builtin(&config.site);

    let transforms: Vec<&str> = if opts.transform == "all" {
        registry.names()
    } else {
        match registry.get(&opts.transform) {
            Some(f) => vec![f.name],
            None => bail!(
                "Unknown transform: '{}'. Available: {}, all",
                opts.transform,
                registry.names().join(", ")
            ),
        }
    };

    let store = DocumentStore::new(&config.content)?;
    let mut paths = store.list(&config.content.root, opts.glob.as_deref())?;
    if let Some(limit) = opts.limit {
        paths.truncate(limit);
    }

    // Read-only precomputation pass: metadata index + topic vectors.
    let index = build_index(config, &store, &paths);
    let ranker = Ranker::new(&config.related);
    let vectors = topic_vectors(&store, &paths, &ranker);
    let by_date = sort_by_date_desc(&index);

    println!(
        "apply {}{} — {} documents, {} transforms",
        opts.transform,
        if opts.dry_run { " (dry-run)" } else { "" },
        paths.len(),
        transforms.len()
    );

    let mut summary = RunSummary::default();
    let runner = TransformRunner::new(&registry);

    for path in &paths {
        let mut doc = match store.load(path) {
            Ok(d) => d,
            Err(e) => {
                summary.records.push(TransformRecord {
                    transform: opts.transform.clone(),
                    slug: path.file_stem().unwrap_or_default().to_string_lossy().to_string(),
                    outcome: Outcome::Error,
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };

        let doc_meta = meta::extract(&doc);
        let ctx = RenderContext {
            related: ranker.rank(&doc.slug, &index, &vectors),
            next: next_story(&doc.slug, &by_date),
            faqs: meta::faq_pairs(&doc),
        };

        for name in &transforms {
            let record = runner.apply(&mut doc, name, &doc_meta, &ctx, opts.force);
            print_record(&record);
            summary.records.push(record);
        }

        if !opts.dry_run {
            // A failed write is scoped to this document like any other
            // error; the rest of the batch still runs.
            match store.save(&mut doc) {
                Ok(true) => summary.files_written += 1,
                Ok(false) => {}
                Err(e) => {
                    let record = TransformRecord {
                        transform: opts.transform.clone(),
                        slug: doc.slug.clone(),
                        outcome: Outcome::Error,
                        detail: Some(format!("write failed: {}", e)),
                    };
                    print_record(&record);
                    summary.records.push(record);
                }
            }
        }
    }

    println!();
    println!("  applied:          {}", summary.count(&Outcome::Applied));
    println!(
        "  already present:  {}",
        summary.count(&Outcome::SkippedAlreadyPresent)
    );
    println!(
        "  ineligible:       {}",
        summary.count(&Outcome::SkippedIneligible)
    );
    println!("  errors:           {}", summary.count(&Outcome::Error));
    if !opts.dry_run {
        println!("  files written:    {}", summary.files_written);
    }

    Ok(summary)
}

/// Preview the ranked related links for one slug.
pub fn run_related(config: &Config, slug: &str) -> Result<()> {
    let store = DocumentStore::new(&config.content)?;
    let paths = store.list(&config.content.root, None)?;
    let index = build_index(config, &store, &paths);

    if !index.iter().any(|m| m.slug == slug) {
        bail!("No article with slug '{}'", slug);
    }

    let ranker = Ranker::new(&config.related);
    let vectors = topic_vectors(&store, &paths, &ranker);
    let links = ranker.rank(slug, &index, &vectors);

    println!("related for {}", slug);
    for link in &links {
        println!("  {:>3}  {:<32} {}", link.score, link.slug, link.title);
    }
    Ok(())
}

/// Show extracted metadata for one slug.
pub fn run_meta(config: &Config, slug: &str) -> Result<()> {
    let store = DocumentStore::new(&config.content)?;
    let path = config.content.root.join(format!("{}.html", slug));
    let doc = store.load(&path)?;
    let m = meta::extract(&doc);

    println!("slug:        {}", m.slug);
    println!("title:       {}", m.title);
    println!("description: {}", m.description);
    println!("category:    {}", m.category);
    println!("date:        {}", m.date);
    println!("url:         {}", m.url);
    Ok(())
}

/// Metadata for all documents, preferring the sidecar index when present.
///
/// Entries for files missing from the sidecar are extracted from HTML, so
/// a stale index degrades gracefully instead of hiding new articles.
/// Unreadable files are left out; the mutation pass reports them when it
/// reaches them.
pub fn build_index(
    config: &Config,
    store: &DocumentStore,
    paths: &[std::path::PathBuf],
) -> Vec<Metadata> {
    let sidecar = meta::load_index(&config.content.index).unwrap_or_default();
    let mut index = Vec::with_capacity(paths.len());

    for path in paths {
        let slug = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(entry) = sidecar.iter().find(|m| m.slug == slug) {
            index.push(entry.clone());
        } else if let Ok(doc) = store.load(path) {
            index.push(meta::extract(&doc));
        }
    }
    index
}

/// Topic vectors are always computed from the HTML itself — headings are
/// not carried in the sidecar index. Unreadable files get no vector.
fn topic_vectors(
    store: &DocumentStore,
    paths: &[std::path::PathBuf],
    ranker: &Ranker,
) -> HashMap<String, Vec<u32>> {
    let mut vectors = HashMap::new();
    for path in paths {
        if let Ok(doc) = store.load(path) {
            let text = meta::topic_text(&doc);
            vectors.insert(doc.slug.clone(), ranker.taxonomy().score(&text));
        }
    }
    vectors
}

fn sort_by_date_desc(index: &[Metadata]) -> Vec<Metadata> {
    let mut sorted = index.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then(a.slug.cmp(&b.slug)));
    sorted
}

/// The next article in publish order (one step older); the oldest wraps
/// around to the newest so every article links somewhere.
fn next_story(slug: &str, by_date: &[Metadata]) -> Option<RelatedLink> {
    if by_date.len() < 2 {
        return None;
    }
    let pos = by_date.iter().position(|m| m.slug == slug)?;
    let next = &by_date[(pos + 1) % by_date.len()];
    Some(RelatedLink {
        slug: next.slug.clone(),
        title: next.title.clone(),
        description: next.description.clone(),
        category: next.category.clone(),
        url: next.url.clone(),
        score: 0,
    })
}

fn print_record(record: &TransformRecord) {
    match &record.detail {
        Some(detail) => println!(
            "  {:<28} {:<18} {} — {}",
            record.slug, record.transform, record.outcome, detail
        ),
        None => println!(
            "  {:<28} {:<18} {}",
            record.slug, record.transform, record.outcome
        ),
    }
}

/// List the registered transforms for `pw list`.
pub fn run_list(config: &Config) -> Result<()> {
    let registry = FragmentRegistry::builtin(&config.site);
    println!("{:<18} {:<26} {}", "TRANSFORM", "MARKER", "ANCHOR");
    println!("{}", "-".repeat(72));
    for f in registry.iter() {
        println!("{:<18} {:<26} {}", f.name, f.marker, f.anchor.describe());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(slug: &str, date: &str) -> Metadata {
        Metadata {
            slug: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
            date: date.to_string(),
            category: "General".to_string(),
            url: format!("/articles/{}.html", slug),
        }
    }

    #[test]
    fn next_story_steps_older_and_wraps() {
        let by_date = sort_by_date_desc(&[
            m("old", "2024-01-01"),
            m("new", "2025-01-01"),
            m("mid", "2024-06-01"),
        ]);
        assert_eq!(next_story("new", &by_date).unwrap().slug, "mid");
        assert_eq!(next_story("mid", &by_date).unwrap().slug, "old");
        assert_eq!(next_story("old", &by_date).unwrap().slug, "new");
    }

    #[test]
    fn next_story_needs_two_articles() {
        let by_date = vec![m("only", "2025-01-01")];
        assert!(next_story("only", &by_date).is_none());
    }
}
