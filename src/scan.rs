//! Lightweight structural HTML scan.
//!
//! Tokenizes tag boundaries into a flat event list with byte offsets, so
//! anchor rules can count occurrences against element structure instead of
//! raw substring matches. This is deliberately not a DOM: legacy articles
//! are too messy for a strict parser, and transforms only need to know
//! *where* tags begin and end.

use crate::error::TransformError;

/// Elements that never take a closing tag in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClose,
    Comment,
    Decl,
}

/// One tag boundary in the document.
#[derive(Debug, Clone)]
pub struct TagEvent {
    /// Lowercased tag name. Empty for comments and declarations.
    pub name: String,
    pub kind: TagKind,
    /// Byte offset of the `<`.
    pub start: usize,
    /// Byte offset one past the `>`.
    pub end: usize,
}

impl TagEvent {
    /// The raw source slice for this event.
    pub fn slice<'a>(&self, content: &'a str) -> &'a str {
        &content[self.start..self.end]
    }
}

/// Scan a document into a flat list of tag events.
///
/// `<script>` and `<style>` bodies are treated as raw text, so `<` inside
/// inline JS does not produce phantom events. Fails with
/// [`TransformError::MalformedDocument`] on unterminated tags or comments.
pub fn scan(content: &str) -> Result<Vec<TagEvent>, TransformError> {
    let bytes = content.as_bytes();
    let mut events = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &content[i..];

        if rest.starts_with("<!--") {
            match content[i + 4..].find("-->") {
                Some(off) => {
                    let end = i + 4 + off + 3;
                    events.push(TagEvent {
                        name: String::new(),
                        kind: TagKind::Comment,
                        start: i,
                        end,
                    });
                    i = end;
                }
                None => {
                    return Err(TransformError::MalformedDocument(
                        "unterminated comment".to_string(),
                    ))
                }
            }
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            match rest.find('>') {
                Some(off) => {
                    let end = i + off + 1;
                    events.push(TagEvent {
                        name: String::new(),
                        kind: TagKind::Decl,
                        start: i,
                        end,
                    });
                    i = end;
                }
                None => {
                    return Err(TransformError::MalformedDocument(
                        "unterminated declaration".to_string(),
                    ))
                }
            }
            continue;
        }

        let closing = rest.starts_with("</");
        let name_start = if closing { i + 2 } else { i + 1 };
        let mut name_end = name_start;
        while name_end < bytes.len()
            && (bytes[name_end].is_ascii_alphanumeric() || bytes[name_end] == b'-')
        {
            name_end += 1;
        }
        if name_end == name_start {
            // Stray `<` in text (e.g. "x < y"). Not a tag.
            i += 1;
            continue;
        }
        let name = content[name_start..name_end].to_ascii_lowercase();

        // Find the closing `>`, skipping over quoted attribute values.
        let mut j = name_end;
        let mut quote: Option<u8> = None;
        let mut tag_end = None;
        while j < bytes.len() {
            let c = bytes[j];
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    b'"' | b'\'' => quote = Some(c),
                    b'>' => {
                        tag_end = Some(j + 1);
                        break;
                    }
                    _ => {}
                },
            }
            j += 1;
        }
        let end = match tag_end {
            Some(e) => e,
            None => {
                return Err(TransformError::MalformedDocument(format!(
                    "unterminated <{}> tag",
                    name
                )))
            }
        };

        let explicit_self_close = end >= 2 && bytes[end - 2] == b'/';
        let kind = if closing {
            TagKind::Close
        } else if explicit_self_close || VOID_ELEMENTS.contains(&name.as_str()) {
            TagKind::SelfClose
        } else {
            TagKind::Open
        };
        events.push(TagEvent {
            name: name.clone(),
            kind,
            start: i,
            end,
        });
        i = end;

        // Raw-text elements: skip to the matching close tag so `<` inside
        // inline JS/CSS is not misread as markup.
        if kind == TagKind::Open && (name == "script" || name == "style") {
            let needle = format!("</{}", name);
            match find_ci(&content[i..], &needle) {
                Some(off) => i += off,
                None => {
                    return Err(TransformError::MalformedDocument(format!(
                        "unterminated <{}> element",
                        name
                    )))
                }
            }
        }
    }

    Ok(events)
}

/// Count of closed paragraph elements — the safety invariant every transform
/// is checked against.
pub fn paragraph_count(events: &[TagEvent]) -> usize {
    events
        .iter()
        .filter(|e| e.kind == TagKind::Close && e.name == "p")
        .count()
}

/// Extract an attribute value from a raw tag slice. Case-insensitive on the
/// attribute name; only quoted values are recognized.
pub fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=", attr.to_ascii_lowercase());
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let abs = from + pos;
        let boundary = abs == 0 || lower.as_bytes()[abs - 1].is_ascii_whitespace();
        if boundary {
            let vstart = abs + needle.len();
            let b = tag.as_bytes();
            if vstart < b.len() && (b[vstart] == b'"' || b[vstart] == b'\'') {
                let q = b[vstart] as char;
                if let Some(off) = tag[vstart + 1..].find(q) {
                    return Some(tag[vstart + 1..vstart + 1 + off].to_string());
                }
            }
        }
        from = abs + needle.len();
    }
    None
}

/// Inner text of the element opened at `events[open_idx]`, up to its
/// matching close tag, with any nested tags stripped.
pub fn element_text(content: &str, events: &[TagEvent], open_idx: usize) -> String {
    let open = &events[open_idx];
    debug_assert_eq!(open.kind, TagKind::Open);
    let mut depth = 0usize;
    let mut close_start = None;
    for e in &events[open_idx + 1..] {
        if e.name != open.name {
            continue;
        }
        match e.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                if depth == 0 {
                    close_start = Some(e.start);
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    let end = match close_start {
        Some(e) => e,
        None => return String::new(),
    };

    // Collect text between events inside the span.
    let mut out = String::new();
    let mut cursor = open.end;
    for e in &events[open_idx + 1..] {
        if e.start >= end {
            break;
        }
        out.push_str(&content[cursor..e.start]);
        cursor = e.end;
    }
    out.push_str(&content[cursor..end]);
    out.trim().to_string()
}

/// Case-insensitive substring search (ASCII).
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    let hay = haystack.as_bytes();
    let nee: Vec<u8> = needle.bytes().map(|b| b.to_ascii_lowercase()).collect();
    if hay.len() < nee.len() {
        return None;
    }
    (0..=hay.len() - nee.len()).find(|&s| {
        hay[s..s + nee.len()]
            .iter()
            .map(|b| b.to_ascii_lowercase())
            .eq(nee.iter().copied())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_open_close_and_void_tags() {
        let events = scan("<html><meta charset=\"utf-8\"><p>hi</p></html>").unwrap();
        let kinds: Vec<(&str, TagKind)> = events
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("html", TagKind::Open),
                ("meta", TagKind::SelfClose),
                ("p", TagKind::Open),
                ("p", TagKind::Close),
                ("html", TagKind::Close),
            ]
        );
    }

    #[test]
    fn script_body_is_raw_text() {
        let html = "<script>if (a < b) { x(); }</script><p>x</p>";
        let events = scan(html).unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["script", "script", "p", "p"]);
    }

    #[test]
    fn quoted_gt_in_attribute_is_not_a_tag_end() {
        let events = scan("<a title=\"a > b\">x</a>").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].slice("<a title=\"a > b\">x</a>"), "<a title=\"a > b\">");
    }

    #[test]
    fn stray_lt_in_text_is_ignored() {
        let events = scan("<p>1 < 2</p>").unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn unterminated_tag_is_malformed() {
        let err = scan("<p>text<div class=").unwrap_err();
        assert!(matches!(err, TransformError::MalformedDocument(_)));
    }

    #[test]
    fn unterminated_comment_is_malformed() {
        let err = scan("<p>x</p><!-- oops").unwrap_err();
        assert!(matches!(err, TransformError::MalformedDocument(_)));
    }

    #[test]
    fn counts_paragraphs() {
        let events = scan("<p>a</p><div><p>b</p></div><p>c</p>").unwrap();
        assert_eq!(paragraph_count(&events), 3);
    }

    #[test]
    fn reads_attribute_values() {
        assert_eq!(
            attr_value("<meta name=\"description\" content=\"Hello\">", "content"),
            Some("Hello".to_string())
        );
        assert_eq!(attr_value("<meta name='x'>", "content"), None);
    }

    #[test]
    fn element_text_strips_nested_tags() {
        let html = "<h1>The <em>Big</em> One</h1>";
        let events = scan(html).unwrap();
        assert_eq!(element_text(html, &events, 0), "The Big One");
    }
}
