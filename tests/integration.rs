use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pagewright::batch::{self, ApplyOptions};
use pagewright::config::Config;
use pagewright::export;
use pagewright::transform::Outcome;

fn article(title: &str, date: &str, category: &str, body_topic: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title} | Example</title>
<meta name="description" content="An article about {topic}.">
<script type="application/ld+json">
{{"@type": "Article", "datePublished": "{date}T00:00:00Z"}}
</script>
</head>
<body>
<span class="hero-tag">{category}</span>
<article>
<h1>{title}</h1>
<h2>Why {topic} matters</h2>
<p>First paragraph about {topic}, with enough context to stand alone as an answer.</p>
<p>Second paragraph.</p>
<p>Third paragraph.</p>
<p>Fourth paragraph.</p>
<p>Fifth paragraph.</p>
</article>
</body>
</html>"#,
        title = title,
        date = date,
        category = category,
        topic = body_topic,
    )
}

fn setup() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("articles");
    fs::create_dir_all(&root).unwrap();

    fs::write(
        root.join("agent-workflows.html"),
        article("Agent Workflows", "2025-03-01", "AI Agents", "agents and automation"),
    )
    .unwrap();
    fs::write(
        root.join("agent-pricing.html"),
        article("Agent Pricing", "2025-02-01", "Business", "agents and enterprise pricing"),
    )
    .unwrap();
    fs::write(
        root.join("remote-careers.html"),
        article("Remote Careers", "2025-01-01", "Work", "remote career employment"),
    )
    .unwrap();
    fs::write(root.join("_TEMPLATE.html"), "<html></html>").unwrap();

    let mut cfg = Config::minimal(&root);
    cfg.output.sitemap = tmp.path().join("sitemap.xml");
    cfg.output.feed = tmp.path().join("feed.xml");
    cfg.related.fallback = vec![
        "agent-workflows".to_string(),
        "agent-pricing".to_string(),
        "remote-careers".to_string(),
    ];
    (tmp, cfg)
}

fn read_all(root: &Path) -> Vec<(PathBuf, String)> {
    let mut out: Vec<(PathBuf, String)> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "html").unwrap_or(false))
        .map(|p| {
            let content = fs::read_to_string(&p).unwrap();
            (p, content)
        })
        .collect();
    out.sort();
    out
}

#[test]
fn apply_all_then_rerun_is_idempotent() {
    let (_tmp, cfg) = setup();
    let opts = ApplyOptions {
        transform: "all".to_string(),
        ..Default::default()
    };

    let first = batch::run_apply(&cfg, &opts).unwrap();
    assert!(!first.has_errors());
    assert_eq!(first.count(&Outcome::Applied), 24); // 8 transforms × 3 articles
    assert_eq!(first.files_written, 3);

    let after_first = read_all(&cfg.content.root);

    let second = batch::run_apply(&cfg, &opts).unwrap();
    assert!(!second.has_errors());
    assert_eq!(second.count(&Outcome::Applied), 0);
    assert_eq!(second.count(&Outcome::SkippedAlreadyPresent), 24);
    assert_eq!(second.files_written, 0);

    // Byte-identical after the second run.
    assert_eq!(after_first, read_all(&cfg.content.root));
}

#[test]
fn template_file_is_never_touched() {
    let (_tmp, cfg) = setup();
    let opts = ApplyOptions {
        transform: "all".to_string(),
        ..Default::default()
    };
    batch::run_apply(&cfg, &opts).unwrap();
    assert_eq!(
        fs::read_to_string(cfg.content.root.join("_TEMPLATE.html")).unwrap(),
        "<html></html>"
    );
}

#[test]
fn dry_run_writes_nothing() {
    let (_tmp, cfg) = setup();
    let before = read_all(&cfg.content.root);

    let summary = batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "all".to_string(),
            dry_run: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(summary.count(&Outcome::Applied), 24);
    assert_eq!(summary.files_written, 0);
    assert_eq!(before, read_all(&cfg.content.root));
}

#[test]
fn related_block_links_topically_closest_articles() {
    let (_tmp, cfg) = setup();
    batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "related-articles".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    // Both agent articles share the ai-agents bucket; each should link
    // the other first.
    let workflows =
        fs::read_to_string(cfg.content.root.join("agent-workflows.html")).unwrap();
    assert!(workflows.contains("/articles/agent-pricing.html"));
    assert!(workflows.contains("Keep Reading"));
}

#[test]
fn apply_all_adds_schema_progress_and_popup() {
    let (_tmp, cfg) = setup();
    batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "all".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    let workflows =
        fs::read_to_string(cfg.content.root.join("agent-workflows.html")).unwrap();
    assert!(workflows.contains("FAQPage"));
    assert!(workflows.contains("Why agents and automation matters?"));
    assert!(workflows.contains("id=\"reading-progress\""));
    assert!(workflows.contains("id=\"exit-popup\""));
    // The schema block lands in the head, before the body starts.
    assert!(workflows.find("FAQPage").unwrap() < workflows.find("<body>").unwrap());
}

#[test]
fn unreadable_file_is_reported_without_stopping_the_batch() {
    let (_tmp, cfg) = setup();
    // Not UTF-8; loading this file fails.
    fs::write(cfg.content.root.join("mojibake.html"), [0xff, 0xfe, 0x00]).unwrap();

    let summary = batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "all".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    // The broken file is one error record; every readable article still
    // gets the full transform sequence and is saved.
    assert!(summary.has_errors());
    assert_eq!(summary.count(&Outcome::Error), 1);
    assert_eq!(summary.count(&Outcome::Applied), 24);
    assert_eq!(summary.files_written, 3);
}

#[test]
fn unknown_transform_is_rejected() {
    let (_tmp, cfg) = setup();
    let err = batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "hero-image".to_string(),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("Unknown transform"));
}

#[test]
fn glob_narrows_the_target_set() {
    let (_tmp, cfg) = setup();
    let summary = batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "analytics".to_string(),
            glob: Some("agent-*.html".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(summary.records.len(), 2);
}

#[test]
fn build_regenerates_index_sitemap_and_feed() {
    let (_tmp, cfg) = setup();
    export::run_build(&cfg).unwrap();

    let index: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&cfg.content.index).unwrap()).unwrap();
    assert_eq!(index.len(), 3);
    // Newest first.
    assert_eq!(index[0]["slug"], "agent-workflows");
    assert_eq!(index[0]["date"], "2025-03-01");
    assert_eq!(index[0]["category"], "AI Agents");

    let sitemap = fs::read_to_string(&cfg.output.sitemap).unwrap();
    assert!(sitemap.contains("<urlset"));
    assert!(sitemap.contains("https://example.com/articles/agent-pricing.html"));
    assert!(sitemap.contains("<lastmod>2025-02-01</lastmod>"));

    let feed = fs::read_to_string(&cfg.output.feed).unwrap();
    assert!(feed.contains("<rss"));
    assert!(feed.contains("<title>Agent Workflows</title>"));
    assert!(feed.contains("Sat, 01 Mar 2025 00:00:00 +0000"));
}

#[test]
fn sidecar_index_overrides_extracted_card_text() {
    let (_tmp, cfg) = setup();

    // A hand-edited sidecar entry should flow into rendered cards.
    let sidecar = serde_json::json!([{
        "slug": "agent-pricing",
        "title": "Custom Sidecar Title",
        "description": "From the sidecar.",
        "date": "2025-02-01",
        "category": "Business",
        "url": "/articles/agent-pricing.html"
    }]);
    fs::write(&cfg.content.index, sidecar.to_string()).unwrap();

    batch::run_apply(
        &cfg,
        &ApplyOptions {
            transform: "related-articles".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    let workflows =
        fs::read_to_string(cfg.content.root.join("agent-workflows.html")).unwrap();
    assert!(workflows.contains("Custom Sidecar Title"));
}

#[test]
fn force_rebuilds_related_without_duplicating() {
    let (_tmp, cfg) = setup();
    let opts = ApplyOptions {
        transform: "related-articles".to_string(),
        ..Default::default()
    };
    batch::run_apply(&cfg, &opts).unwrap();

    let forced = ApplyOptions {
        force: true,
        ..opts
    };
    batch::run_apply(&cfg, &forced).unwrap();

    let workflows =
        fs::read_to_string(cfg.content.root.join("agent-workflows.html")).unwrap();
    assert_eq!(workflows.matches("related-grid").count(), 1);
}
