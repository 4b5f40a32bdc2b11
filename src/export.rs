//! `pw build` — regenerate the derived artifacts.
//!
//! The JSON index, sitemap, and RSS feed are pure functions of the
//! metadata set: every run re-extracts from the HTML on disk and rewrites
//! all three, so they can never drift further than one build behind the
//! content.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::Config;
use crate::meta::{self, Metadata};
use crate::store::DocumentStore;

pub fn run_build(config: &Config) -> Result<()> {
    let store = DocumentStore::new(&config.content)?;
    let paths = store.list(&config.content.root, None)?;

    let mut articles = Vec::with_capacity(paths.len());
    for path in &paths {
        let doc = store.load(path)?;
        articles.push(meta::extract(&doc));
    }
    articles.sort_by(|a, b| b.date.cmp(&a.date).then(a.slug.cmp(&b.slug)));

    write_index(config, &articles)?;
    write_sitemap(config, &articles)?;
    write_feed(config, &articles)?;

    println!("build");
    println!("  articles indexed: {}", articles.len());
    println!("  index:   {}", config.content.index.display());
    println!("  sitemap: {}", config.output.sitemap.display());
    println!("  feed:    {}", config.output.feed.display());
    Ok(())
}

fn write_index(config: &Config, articles: &[Metadata]) -> Result<()> {
    let json = serde_json::to_string_pretty(articles)?;
    std::fs::write(&config.content.index, json)
        .with_context(|| format!("Failed to write {}", config.content.index.display()))?;
    Ok(())
}

fn write_sitemap(config: &Config, articles: &[Metadata]) -> Result<()> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
    writer.write_event(Event::Start(urlset))?;

    for page in &config.output.static_pages {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", &format!("{}{}", config.site.url, page))?;
        text_element(&mut writer, "changefreq", "weekly")?;
        text_element(
            &mut writer,
            "priority",
            if page == "/" { "1.0" } else { "0.7" },
        )?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    for article in articles {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        text_element(
            &mut writer,
            "loc",
            &format!("{}{}", config.site.url, article.url),
        )?;
        text_element(&mut writer, "lastmod", &article.date)?;
        text_element(&mut writer, "changefreq", "monthly")?;
        text_element(&mut writer, "priority", "0.8")?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    std::fs::write(&config.output.sitemap, writer.into_inner())
        .with_context(|| format!("Failed to write {}", config.output.sitemap.display()))?;
    Ok(())
}

fn write_feed(config: &Config, articles: &[Metadata]) -> Result<()> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &config.site.name)?;
    text_element(&mut writer, "link", &config.site.url)?;
    text_element(&mut writer, "description", &config.site.description)?;
    text_element(&mut writer, "language", "en-us")?;
    text_element(
        &mut writer,
        "lastBuildDate",
        &chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S +0000").to_string(),
    )?;

    let mut atom_link = BytesStart::new("atom:link");
    atom_link.push_attribute(("href", format!("{}/feed.xml", config.site.url).as_str()));
    atom_link.push_attribute(("rel", "self"));
    atom_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(atom_link))?;

    for article in articles.iter().take(config.output.feed_limit) {
        let url = format!("{}{}", config.site.url, article.url);
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &article.title)?;
        text_element(&mut writer, "link", &url)?;
        text_element(&mut writer, "description", &article.description)?;
        text_element(&mut writer, "pubDate", &rfc2822_midnight(&article.date))?;
        text_element(&mut writer, "guid", &url)?;
        text_element(&mut writer, "category", &article.category)?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    std::fs::write(&config.output.feed, writer.into_inner())
        .with_context(|| format!("Failed to write {}", config.output.feed.display()))?;
    Ok(())
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `YYYY-MM-DD` → RFC 2822 at midnight UTC, the shape RSS readers expect.
fn rfc2822_midnight(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| {
            d.and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .format("%a, %d %b %Y %H:%M:%S +0000")
                .to_string()
        })
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_formats_midnight() {
        assert_eq!(
            rfc2822_midnight("2025-03-14"),
            "Fri, 14 Mar 2025 00:00:00 +0000"
        );
    }

    #[test]
    fn rfc2822_passes_through_garbage() {
        assert_eq!(rfc2822_midnight("not-a-date"), "not-a-date");
    }
}
