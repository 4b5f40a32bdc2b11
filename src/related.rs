//! Topic-similarity ranking for related-article links.
//!
//! Each document gets a topic vector: per-bucket keyword hit counts over
//! its title, description, and headings. Similarity between two documents
//! is the sum over buckets of `min(countA, countB)` — intersection-style
//! overlap that favors documents sharing multiple strong topics over
//! documents sharing one extremely strong topic. No normalization by
//! document length; the heuristic is kept deliberately simple.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::config::RelatedConfig;
use crate::meta::Metadata;

/// A rendered related-content link: target identity plus the card fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedLink {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub url: String,
    /// Topic overlap with the source document. Zero for fallback padding.
    pub score: u32,
}

/// Ordered bucket name → keyword list. Ordering is fixed so topic vectors
/// are comparable across documents.
#[derive(Debug, Clone)]
pub struct TopicTaxonomy {
    buckets: Vec<(String, Vec<String>)>,
}

impl TopicTaxonomy {
    /// The default bucket set for the content niche this tool grew up in.
    pub fn default_buckets() -> Self {
        let raw: &[(&str, &[&str])] = &[
            (
                "ai-agents",
                &["agent", "agents", "autonomous", "automation", "workflow", "orchestrat", "multi-agent"],
            ),
            (
                "enterprise",
                &["enterprise", "business", "company", "corporate", "strategy", "roi", "pricing"],
            ),
            (
                "llm",
                &["llm", "language model", "chatgpt", "claude", "gemini", "gpt", "model"],
            ),
            (
                "productivity",
                &["productivity", "workflow", "efficiency", "automate", "save time"],
            ),
            (
                "side-projects",
                &["side project", "side hustle", "passive income", "indie", "solopreneur"],
            ),
            ("tools", &["tool", "software", "saas", "app", "platform"]),
            (
                "future-work",
                &["future of work", "remote", "async", "career", "job", "employment"],
            ),
            (
                "marketing",
                &["marketing", "content", "seo", "growth", "audience"],
            ),
            (
                "technical",
                &["code", "api", "developer", "infrastructure", "deploy", "build"],
            ),
            (
                "money",
                &["revenue", "income", "monetiz", "pricing", "$", "profit", "cost"],
            ),
        ];
        Self {
            buckets: raw
                .iter()
                .map(|(name, kws)| {
                    (
                        name.to_string(),
                        kws.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Taxonomy from config overrides, or the default set when none given.
    pub fn from_config(buckets: &BTreeMap<String, Vec<String>>) -> Self {
        if buckets.is_empty() {
            return Self::default_buckets();
        }
        Self {
            buckets: buckets
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Per-bucket keyword hit counts for lowercased article text.
    pub fn score(&self, text: &str) -> Vec<u32> {
        self.buckets
            .iter()
            .map(|(_, keywords)| {
                keywords
                    .iter()
                    .map(|k| count_occurrences(text, &k.to_lowercase()) as u32)
                    .sum()
            })
            .collect()
    }
}

/// Intersection-style overlap between two topic vectors.
pub fn similarity(a: &[u32], b: &[u32]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (*x).min(*y)).sum()
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        count += 1;
        from += pos + needle.len();
    }
    count
}

pub struct Ranker {
    taxonomy: TopicTaxonomy,
    k: usize,
    fallback: Vec<String>,
}

impl Ranker {
    pub fn new(cfg: &RelatedConfig) -> Self {
        Self {
            taxonomy: TopicTaxonomy::from_config(&cfg.buckets),
            k: cfg.k,
            fallback: cfg.fallback.clone(),
        }
    }

    pub fn taxonomy(&self) -> &TopicTaxonomy {
        &self.taxonomy
    }

    /// Rank every other document against `target_slug`, returning up to
    /// `k` links: nonzero-similarity candidates first (score desc, newer
    /// date wins ties, slug as the final tiebreak), padded from the
    /// fallback list so every article always renders `k` cards.
    pub fn rank(
        &self,
        target_slug: &str,
        index: &[Metadata],
        vectors: &HashMap<String, Vec<u32>>,
    ) -> Vec<RelatedLink> {
        let empty = Vec::new();
        let target_vec = vectors.get(target_slug).unwrap_or(&empty);

        let mut scored: Vec<(&Metadata, u32)> = index
            .iter()
            .filter(|m| m.slug != target_slug)
            .map(|m| {
                let sim = vectors
                    .get(&m.slug)
                    .map(|v| similarity(target_vec, v))
                    .unwrap_or(0);
                (m, sim)
            })
            .filter(|(_, sim)| *sim > 0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(b.0.date.cmp(&a.0.date))
                .then(a.0.slug.cmp(&b.0.slug))
        });

        let mut links: Vec<RelatedLink> = scored
            .into_iter()
            .take(self.k)
            .map(|(m, sim)| make_link(m, sim))
            .collect();

        // Pad from the fallback list rather than rendering fewer than k
        // cards; the grid layout depends on a fixed card count.
        if links.len() < self.k {
            for slug in &self.fallback {
                if links.len() >= self.k {
                    break;
                }
                if slug == target_slug || links.iter().any(|l| &l.slug == slug) {
                    continue;
                }
                if let Some(m) = index.iter().find(|m| &m.slug == slug) {
                    links.push(make_link(m, 0));
                }
            }
        }

        links
    }
}

fn make_link(m: &Metadata, score: u32) -> RelatedLink {
    RelatedLink {
        slug: m.slug.clone(),
        title: m.title.clone(),
        description: m.description.clone(),
        category: m.category.clone(),
        url: m.url.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(slug: &str, date: &str) -> Metadata {
        Metadata {
            slug: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
            date: date.to_string(),
            category: "General".to_string(),
            url: format!("/articles/{}.html", slug),
        }
    }

    fn ranker(k: usize, fallback: &[&str]) -> Ranker {
        Ranker {
            taxonomy: TopicTaxonomy::default_buckets(),
            k,
            fallback: fallback.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn keyword_hits_accumulate_per_bucket() {
        let tax = TopicTaxonomy::default_buckets();
        let v = tax.score("agents building agents with automation");
        // "ai-agents" is the first bucket in the default taxonomy.
        assert!(v[0] >= 3);
    }

    #[test]
    fn similarity_is_min_overlap() {
        assert_eq!(similarity(&[3, 0, 2], &[1, 5, 2]), 3);
        assert_eq!(similarity(&[0, 0], &[4, 4]), 0);
    }

    #[test]
    fn shared_multiple_topics_beats_single_strong_topic() {
        // Target and `both` share ai-agents heavily and enterprise lightly;
        // `single` shares only enterprise, heavily.
        let index = vec![
            meta("target", "2025-01-01"),
            meta("both", "2025-01-02"),
            meta("single", "2025-01-03"),
        ];
        let mut vectors = HashMap::new();
        vectors.insert("target".to_string(), vec![5, 2, 0]);
        vectors.insert("both".to_string(), vec![6, 1, 0]);
        vectors.insert("single".to_string(), vec![0, 9, 0]);

        let r = ranker(2, &[]);
        let links = r.rank("target", &index, &vectors);
        assert_eq!(links[0].slug, "both"); // min-sum 5+1=6 beats 2
        assert_eq!(links[1].slug, "single");
    }

    #[test]
    fn ties_prefer_newer_date() {
        let index = vec![
            meta("target", "2025-01-01"),
            meta("older", "2024-06-01"),
            meta("newer", "2025-05-01"),
        ];
        let mut vectors = HashMap::new();
        vectors.insert("target".to_string(), vec![2]);
        vectors.insert("older".to_string(), vec![2]);
        vectors.insert("newer".to_string(), vec![2]);

        let r = ranker(2, &[]);
        let links = r.rank("target", &index, &vectors);
        assert_eq!(links[0].slug, "newer");
    }

    #[test]
    fn self_is_excluded() {
        let index = vec![meta("target", "2025-01-01"), meta("other", "2025-01-02")];
        let mut vectors = HashMap::new();
        vectors.insert("target".to_string(), vec![3]);
        vectors.insert("other".to_string(), vec![3]);

        let r = ranker(3, &[]);
        let links = r.rank("target", &index, &vectors);
        assert!(links.iter().all(|l| l.slug != "target"));
    }

    #[test]
    fn zero_similarity_pads_from_fallback_to_exactly_k() {
        let index = vec![
            meta("target", "2025-01-01"),
            meta("alpha", "2025-01-02"),
            meta("beta", "2025-01-03"),
            meta("gamma", "2025-01-04"),
        ];
        let mut vectors = HashMap::new();
        vectors.insert("target".to_string(), vec![0, 0]);
        vectors.insert("alpha".to_string(), vec![0, 7]);
        vectors.insert("beta".to_string(), vec![0, 0]);
        vectors.insert("gamma".to_string(), vec![0, 0]);

        let r = ranker(3, &["alpha", "beta", "gamma"]);
        let links = r.rank("target", &index, &vectors);
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| l.score == 0));
        assert_eq!(links[0].slug, "alpha");
    }

    #[test]
    fn rank_is_deterministic() {
        let index = vec![
            meta("target", "2025-01-01"),
            meta("a", "2025-01-02"),
            meta("b", "2025-01-02"),
            meta("c", "2025-01-02"),
        ];
        let mut vectors = HashMap::new();
        for slug in ["target", "a", "b", "c"] {
            vectors.insert(slug.to_string(), vec![1, 1]);
        }
        let r = ranker(2, &[]);
        let first = r.rank("target", &index, &vectors);
        let second = r.rank("target", &index, &vectors);
        assert_eq!(first, second);
        // Equal score and date fall back to slug order.
        assert_eq!(first[0].slug, "a");
        assert_eq!(first[1].slug, "b");
    }
}
