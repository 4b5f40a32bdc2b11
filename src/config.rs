use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    pub content: ContentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub related: RelatedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Canonical site URL without trailing slash, e.g. `https://example.com`.
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// GA4 measurement id, e.g. `G-XXXXXXXXXX`. Doubles as the idempotency
    /// marker for the analytics transform.
    pub analytics_id: String,
    /// Newsletter subscribe form action URL for the CTA fragments.
    pub newsletter_form_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Directory of article HTML files.
    pub root: PathBuf,
    /// Sidecar JSON index. Preferred over re-parsing HTML when present;
    /// regenerated by `pw build`.
    pub index: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    /// File names never touched by transforms.
    #[serde(default = "default_deny")]
    pub deny: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.html".to_string()]
}

fn default_deny() -> Vec<String> {
    vec!["_TEMPLATE.html".to_string(), "index.html".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_sitemap")]
    pub sitemap: PathBuf,
    #[serde(default = "default_feed")]
    pub feed: PathBuf,
    /// Static page paths included in the sitemap ahead of articles.
    #[serde(default = "default_static_pages")]
    pub static_pages: Vec<String>,
    /// Cap on RSS items, newest first.
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sitemap: default_sitemap(),
            feed: default_feed(),
            static_pages: default_static_pages(),
            feed_limit: default_feed_limit(),
        }
    }
}

fn default_sitemap() -> PathBuf {
    PathBuf::from("./sitemap.xml")
}
fn default_feed() -> PathBuf {
    PathBuf::from("./feed.xml")
}
fn default_static_pages() -> Vec<String> {
    vec![
        "/".to_string(),
        "/articles/".to_string(),
        "/about.html".to_string(),
        "/subscribe.html".to_string(),
    ]
}
fn default_feed_limit() -> usize {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelatedConfig {
    /// Every article always renders exactly `k` related cards.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Slugs used to pad the related list when too few candidates share a
    /// topic. Order matters.
    #[serde(default)]
    pub fallback: Vec<String>,
    /// Topic buckets: bucket name → keyword list. Empty means use the
    /// built-in taxonomy. BTreeMap keeps scoring order deterministic.
    #[serde(default)]
    pub buckets: BTreeMap<String, Vec<String>>,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            fallback: Vec::new(),
            buckets: BTreeMap::new(),
        }
    }
}

fn default_k() -> usize {
    3
}

impl Config {
    /// A minimal config for tests and commands that can run without a
    /// config file on disk.
    pub fn minimal(root: &Path) -> Self {
        Self {
            site: SiteConfig {
                url: "https://example.com".to_string(),
                name: "Example".to_string(),
                description: String::new(),
                analytics_id: "G-TEST000000".to_string(),
                newsletter_form_url: "https://example.com/subscribe".to_string(),
            },
            content: ContentConfig {
                root: root.to_path_buf(),
                index: root.join("articles.json"),
                include_globs: default_include_globs(),
                deny: default_deny(),
            },
            output: OutputConfig::default(),
            related: RelatedConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.related.k < 1 {
        anyhow::bail!("related.k must be >= 1");
    }
    if config.site.url.ends_with('/') {
        anyhow::bail!("site.url must not end with '/'");
    }
    for (bucket, keywords) in &config.related.buckets {
        if keywords.is_empty() {
            anyhow::bail!("related.buckets.{} must list at least one keyword", bucket);
        }
    }

    Ok(config)
}
