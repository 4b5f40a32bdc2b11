//! Named HTML fragments and their insertion rules.
//!
//! Each fragment bundles a render template, an idempotency marker (a
//! substring whose presence means the transform already ran), an anchor
//! rule, and — for regeneratable blocks — begin/end sentinel comments that
//! delimit the region a re-run may replace.
//!
//! Rendering is pure: a fragment produces new text from metadata and
//! context, and never touches the document. Splicing happens in
//! [`crate::transform`].

use crate::anchor::AnchorRule;
use crate::config::SiteConfig;
use crate::meta::{FaqPair, Metadata};
use crate::related::RelatedLink;

/// Related-card title/description caps, carried over from the original
/// site's card layout.
const CARD_TITLE_MAX: usize = 70;
const CARD_DESC_MAX: usize = 120;

/// Transform-specific inputs supplied by the batch runner.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Ranked related links for the current document.
    pub related: Vec<RelatedLink>,
    /// The next article in publish order, for the next-story block.
    pub next: Option<RelatedLink>,
    /// Heading/paragraph pairs for the FAQ structured-data block.
    pub faqs: Vec<FaqPair>,
}

/// A named, parameterized block of markup plus its insertion rules.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: &'static str,
    /// Unique substring marking a document as already transformed.
    pub marker: String,
    pub anchor: AnchorRule,
    /// Begin/end sentinel comment prefixes for replaceable regions.
    pub region: Option<(&'static str, &'static str)>,
}

pub const RELATED_BEGIN: &str = "<!-- Related Articles Section";
pub const RELATED_END: &str = "<!-- End Related Articles";
pub const NEXT_STORY_BEGIN: &str = "<!-- Next Story";
pub const NEXT_STORY_END: &str = "<!-- End Next Story";

pub struct FragmentRegistry {
    site: SiteConfig,
    fragments: Vec<Fragment>,
}

impl FragmentRegistry {
    /// The built-in fragment set, in the order `apply all` runs them.
    pub fn builtin(site: &SiteConfig) -> Self {
        let fragments = vec![
            Fragment {
                name: "analytics",
                marker: site.analytics_id.clone(),
                anchor: AnchorRule::AfterNth {
                    marker: "<head>".to_string(),
                    n: 1,
                },
                region: None,
            },
            Fragment {
                name: "faq-schema",
                marker: "FAQPage".to_string(),
                anchor: AnchorRule::BeforeFirst("</head>".to_string()),
                region: None,
            },
            Fragment {
                name: "progress-bar",
                marker: "reading-progress".to_string(),
                anchor: AnchorRule::AfterNth {
                    marker: "<body>".to_string(),
                    n: 1,
                },
                region: None,
            },
            Fragment {
                name: "inline-cta",
                marker: "inline-newsletter-cta".to_string(),
                anchor: AnchorRule::AfterNth {
                    marker: "</p>".to_string(),
                    n: 4,
                },
                region: None,
            },
            Fragment {
                name: "related-articles",
                marker: "related-articles".to_string(),
                anchor: AnchorRule::BeforeLast("</body>".to_string()),
                region: Some((RELATED_BEGIN, RELATED_END)),
            },
            Fragment {
                name: "next-story",
                marker: "next-story".to_string(),
                anchor: AnchorRule::EndOfContainer {
                    open: "<article>".to_string(),
                    close: "</article>".to_string(),
                },
                region: Some((NEXT_STORY_BEGIN, NEXT_STORY_END)),
            },
            Fragment {
                name: "sticky-bar",
                marker: "sticky-cta-bar".to_string(),
                anchor: AnchorRule::AtUnique("</body>".to_string()),
                region: None,
            },
            Fragment {
                name: "exit-popup",
                marker: "exit-popup".to_string(),
                anchor: AnchorRule::BeforeLast("</body>".to_string()),
                region: None,
            },
        ];
        Self {
            site: site.clone(),
            fragments,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fragments.iter().map(|f| f.name).collect()
    }

    /// Render a fragment for one document.
    ///
    /// `None` means the fragment cannot be rendered with the inputs at hand
    /// (unknown name, or a context-dependent fragment with no context) —
    /// the runner reports that as skipped-ineligible.
    pub fn render(&self, name: &str, _meta: &Metadata, ctx: &RenderContext) -> Option<String> {
        match name {
            "analytics" => Some(self.render_analytics()),
            "inline-cta" => Some(self.render_inline_cta()),
            "sticky-bar" => Some(self.render_sticky_bar()),
            "exit-popup" => Some(self.render_exit_popup()),
            "progress-bar" => Some(render_progress_bar()),
            "faq-schema" => {
                if ctx.faqs.is_empty() {
                    None
                } else {
                    render_faq_schema(&ctx.faqs)
                }
            }
            "related-articles" => {
                if ctx.related.is_empty() {
                    None
                } else {
                    Some(render_related(&ctx.related))
                }
            }
            "next-story" => ctx.next.as_ref().map(render_next_story),
            _ => None,
        }
    }

    fn render_analytics(&self) -> String {
        format!(
            r#"
    <!-- Google tag (gtag.js) -->
    <script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
    <script>
      window.dataLayer = window.dataLayer || [];
      function gtag(){{dataLayer.push(arguments);}}
      gtag('js', new Date());
      gtag('config', '{id}');
    </script>
"#,
            id = self.site.analytics_id
        )
    }

    fn render_inline_cta(&self) -> String {
        format!(
            r#"
        <!-- Inline Newsletter CTA -->
        <div class="inline-newsletter-cta">
            <h3>Want more like this?</h3>
            <p>Join {name} readers getting weekly insights. No spam, unsubscribe anytime.</p>
            <form action="{form}" method="POST" target="_blank">
                <input type="email" name="email" placeholder="your@email.com" required>
                <button type="submit">Subscribe Free</button>
            </form>
        </div>
"#,
            name = self.site.name,
            form = self.site.newsletter_form_url
        )
    }

    fn render_sticky_bar(&self) -> String {
        format!(
            r#"
    <!-- Sticky Newsletter Bar -->
    <div class="sticky-cta-bar" id="stickyCta">
        <span class="sticky-cta-text">Enjoying this? Get the weekly digest.</span>
        <form action="{form}" method="POST" target="_blank">
            <input type="email" name="email" placeholder="your@email.com" required>
            <button type="submit">Subscribe</button>
        </form>
        <button class="sticky-cta-close" onclick="document.getElementById('stickyCta').remove()">&times;</button>
    </div>
    <script>
      window.addEventListener('scroll', function () {{
        var bar = document.getElementById('stickyCta');
        if (!bar) return;
        var depth = window.scrollY / (document.body.scrollHeight - window.innerHeight);
        if (depth > 0.3) bar.classList.add('visible');
      }});
    </script>
"#,
            form = self.site.newsletter_form_url
        )
    }

    fn render_exit_popup(&self) -> String {
        format!(
            r#"
    <!-- Exit Intent Popup -->
    <div class="exit-popup-overlay" id="exit-popup">
        <div class="exit-popup">
            <button class="exit-popup-close" onclick="document.getElementById('exit-popup').remove()">&times;</button>
            <h3>Before you go...</h3>
            <span>Get the weekly digest. One email, no spam.</span>
            <form action="{form}" method="POST" target="_blank">
                <input type="email" name="email" placeholder="your@email.com" required>
                <button type="submit">Subscribe Free</button>
            </form>
        </div>
    </div>
    <script>
      document.addEventListener('mouseleave', function (e) {{
        var popup = document.getElementById('exit-popup');
        if (!popup || e.clientY > 0 || sessionStorage.getItem('exitShown')) return;
        popup.classList.add('visible');
        sessionStorage.setItem('exitShown', '1');
      }});
    </script>
"#,
            form = self.site.newsletter_form_url
        )
    }
}

fn render_progress_bar() -> String {
    r#"
    <div id="reading-progress"></div>
    <style>
    #reading-progress {
        position: fixed;
        top: 0;
        left: 0;
        width: 0%;
        height: 3px;
        background: linear-gradient(90deg, #FF5A5F, #FF7F7F);
        z-index: 1000;
        transition: width 0.1s ease-out;
    }
    </style>
    <script>
    document.addEventListener('DOMContentLoaded', function () {
        var progressBar = document.getElementById('reading-progress');
        function updateProgress() {
            var scrollTop = window.scrollY;
            var docHeight = document.documentElement.scrollHeight - window.innerHeight;
            var progress = Math.min(100, Math.max(0, (scrollTop / docHeight) * 100));
            progressBar.style.width = progress + '%';
        }
        window.addEventListener('scroll', updateProgress);
        updateProgress();
    });
    </script>
"#
    .to_string()
}

fn render_faq_schema(faqs: &[FaqPair]) -> Option<String> {
    let entities: Vec<serde_json::Value> = faqs
        .iter()
        .map(|f| {
            serde_json::json!({
                "@type": "Question",
                "name": f.question,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": f.answer,
                },
            })
        })
        .collect();
    let schema = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": entities,
    });
    let body = serde_json::to_string_pretty(&schema).ok()?;
    Some(format!(
        "    <script type=\"application/ld+json\">\n{}\n    </script>\n",
        body
    ))
}

fn render_related(links: &[RelatedLink]) -> String {
    let mut cards = String::new();
    for link in links {
        cards.push_str(&format!(
            r#"
            <a href="{url}" class="related-card">
                <span class="related-category">{category}</span>
                <h4>{title}</h4>
                <p>{description}</p>
            </a>"#,
            url = link.url,
            category = link.category,
            title = truncate(&link.title, CARD_TITLE_MAX),
            description = truncate(&link.description, CARD_DESC_MAX),
        ));
    }
    format!(
        r#"
{begin} - Auto-generated -->
<div class="related-articles">
    <h3>Keep Reading</h3>
    <div class="related-grid">{cards}
    </div>
</div>
{end} -->
"#,
        begin = RELATED_BEGIN,
        end = RELATED_END,
        cards = cards,
    )
}

fn render_next_story(next: &RelatedLink) -> String {
    format!(
        r#"
{begin} -->
<a href="{url}" class="next-story">
    <div class="next-story-content">
        <div class="next-story-label">Next Story</div>
        <div class="next-story-title">{title}</div>
    </div>
    <div class="next-story-arrow">&rarr;</div>
</a>
{end} -->
"#,
        begin = NEXT_STORY_BEGIN,
        end = NEXT_STORY_END,
        url = next.url,
        title = truncate(&next.title, CARD_TITLE_MAX),
    )
}

/// Truncate on a character boundary, appending `...` like the original
/// card layout did.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
