//! `pw validate` — per-article required-element audit.
//!
//! Run on every deploy to catch template drift early: articles that lost
//! their analytics tag, social cards, or share buttons during a bad batch
//! run show up here before they ship.

use anyhow::Result;

use crate::config::Config;
use crate::store::{Document, DocumentStore};

/// Accent colors from retired themes; their presence means an article was
/// never migrated.
const RETIRED_ACCENTS: &[&str] = &["#6366F1", "#6366f1", "#ec4899", "#EC4899"];

/// One failed check on one article.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub slug: String,
    pub message: String,
}

pub fn run_validate(config: &Config) -> Result<Vec<ValidationIssue>> {
    let store = DocumentStore::new(&config.content)?;
    let paths = store.list(&config.content.root, None)?;

    let mut issues = Vec::new();
    let mut checked = 0usize;

    for path in &paths {
        let doc = store.load(path)?;
        checked += 1;
        let doc_issues = validate_document(&doc, config);
        if doc_issues.is_empty() {
            continue;
        }
        println!("FAIL {}", doc.slug);
        for issue in &doc_issues {
            println!("  - {}", issue.message);
        }
        issues.extend(doc_issues);
    }

    println!();
    if issues.is_empty() {
        println!("ok — {} articles validated", checked);
    } else {
        println!(
            "{} issue(s) across {} article(s)",
            issues.len(),
            issues.iter().map(|i| &i.slug).collect::<std::collections::HashSet<_>>().len()
        );
    }
    Ok(issues)
}

/// The required-element checklist for a single article.
pub fn validate_document(doc: &Document, config: &Config) -> Vec<ValidationIssue> {
    let content = doc.content();
    let required: Vec<(&str, String)> = vec![
        ("analytics tag", config.site.analytics_id.clone()),
        ("twitter card", "twitter:card".to_string()),
        ("og image", "og:image".to_string()),
        ("favicon", "favicon".to_string()),
        ("share buttons", "share-btn".to_string()),
        ("author bio", "author-bio".to_string()),
    ];

    let mut issues = Vec::new();
    for (label, needle) in &required {
        if !content.contains(needle.as_str()) {
            issues.push(ValidationIssue {
                slug: doc.slug.clone(),
                message: format!("missing: {}", label),
            });
        }
    }

    for accent in RETIRED_ACCENTS {
        if content.contains(accent) {
            issues.push(ValidationIssue {
                slug: doc.slug.clone(),
                message: format!("retired accent color present: {}", accent),
            });
            break;
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn complete_article(analytics_id: &str) -> String {
        format!(
            r#"<html><head>
<script src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
<meta name="twitter:card" content="summary_large_image">
<meta property="og:image" content="/images/og.jpg">
<link rel="icon" href="/favicon.ico">
</head><body>
<a class="share-btn">share</a>
<div class="author-bio">bio</div>
</body></html>"#,
            id = analytics_id
        )
    }

    #[test]
    fn complete_article_passes() {
        let cfg = Config::minimal(std::path::Path::new("."));
        let doc = Document::from_content("ok", &complete_article(&cfg.site.analytics_id));
        assert!(validate_document(&doc, &cfg).is_empty());
    }

    #[test]
    fn missing_elements_are_reported() {
        let cfg = Config::minimal(std::path::Path::new("."));
        let doc = Document::from_content("bare", "<html><body><p>x</p></body></html>");
        let issues = validate_document(&doc, &cfg);
        assert_eq!(issues.len(), 6);
        assert!(issues.iter().any(|i| i.message.contains("analytics")));
    }

    #[test]
    fn retired_accent_is_flagged() {
        let cfg = Config::minimal(std::path::Path::new("."));
        let mut html = complete_article(&cfg.site.analytics_id);
        html.push_str("<style>a { color: #6366F1; }</style>");
        let doc = Document::from_content("stale", &html);
        let issues = validate_document(&doc, &cfg);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("retired accent"));
    }
}
