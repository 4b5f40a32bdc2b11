//! Document loading, listing, and atomic persistence.
//!
//! Documents are loaded once per run, mutated in memory, and written back
//! only when dirty. Saves go through a temp file + rename in the same
//! directory, so a killed run leaves every file either fully old or fully
//! new — the truncated-HTML failure mode of the old scripts cannot happen.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ContentConfig;
use crate::error::StoreError;

/// One HTML file held in memory during a run.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    /// File stem; the unique identifier for a content document.
    pub slug: String,
    content: String,
    dirty: bool,
}

impl Document {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the content, marking the document dirty only if it actually
    /// changed. Transforms that produce byte-identical output stay clean.
    pub fn set_content(&mut self, new: String) {
        if new != self.content {
            self.content = new;
            self.dirty = true;
        }
    }

    /// Build a document directly from a string (tests, previews).
    pub fn from_content(slug: &str, content: &str) -> Self {
        Self {
            path: PathBuf::from(format!("{}.html", slug)),
            slug: slug.to_string(),
            content: content.to_string(),
            dirty: false,
        }
    }
}

pub struct DocumentStore {
    include: GlobSet,
    deny: Vec<String>,
}

impl DocumentStore {
    pub fn new(content: &ContentConfig) -> Result<Self, StoreError> {
        let include = build_globset(&content.include_globs)
            .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;
        Ok(Self {
            include,
            deny: content.deny.clone(),
        })
    }

    pub fn load(&self, path: &Path) -> Result<Document, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let slug = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Document {
            path: path.to_path_buf(),
            slug,
            content,
            dirty: false,
        })
    }

    /// Persist a document if dirty. Returns `true` if a write happened.
    pub fn save(&self, doc: &mut Document) -> Result<bool, StoreError> {
        if !doc.dirty {
            return Ok(false);
        }
        let dir = doc.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(doc.content.as_bytes())?;
        tmp.persist(&doc.path)
            .map_err(|e| StoreError::Io(e.error))?;
        doc.dirty = false;
        Ok(true)
    }

    /// List content files under `root`, newest-agnostic, sorted by path for
    /// deterministic run order. Denylisted file names (templates, index
    /// pages) are excluded; an extra glob narrows the set further.
    pub fn list(&self, root: &Path, pattern: Option<&str>) -> Result<Vec<PathBuf>, StoreError> {
        let extra = match pattern {
            Some(p) => Some(
                Glob::new(p)
                    .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?
                    .compile_matcher(),
            ),
            None => None,
        };

        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(root).unwrap_or(path);
            let rel_str = rel.to_string_lossy().to_string();

            if !self.include.is_match(&rel_str) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.deny.iter().any(|d| d == name.as_ref()) {
                continue;
            }
            if let Some(ref m) = extra {
                if !m.is_match(&rel_str) {
                    continue;
                }
            }
            paths.push(path.to_path_buf());
        }

        paths.sort();
        Ok(paths)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn store_in(dir: &Path) -> DocumentStore {
        let cfg = Config::minimal(dir);
        DocumentStore::new(&cfg.content).unwrap()
    }

    #[test]
    fn load_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(tmp.path());
        let err = store.load(&tmp.path().join("nope.html")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn save_is_noop_when_clean() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.html");
        std::fs::write(&path, "<p>x</p>").unwrap();
        let store = store_in(tmp.path());
        let mut doc = store.load(&path).unwrap();
        assert!(!store.save(&mut doc).unwrap());
    }

    #[test]
    fn save_writes_and_clears_dirty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.html");
        std::fs::write(&path, "<p>x</p>").unwrap();
        let store = store_in(tmp.path());
        let mut doc = store.load(&path).unwrap();
        doc.set_content("<p>y</p>".to_string());
        assert!(doc.is_dirty());
        assert!(store.save(&mut doc).unwrap());
        assert!(!doc.is_dirty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>y</p>");
    }

    #[test]
    fn identical_content_does_not_dirty() {
        let mut doc = Document::from_content("a", "<p>x</p>");
        doc.set_content("<p>x</p>".to_string());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn list_excludes_denylist_and_non_html() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("one.html"), "x").unwrap();
        std::fs::write(tmp.path().join("two.html"), "x").unwrap();
        std::fs::write(tmp.path().join("_TEMPLATE.html"), "x").unwrap();
        std::fs::write(tmp.path().join("index.html"), "x").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        let store = store_in(tmp.path());
        let paths = store.list(tmp.path(), None).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["one.html", "two.html"]);
    }

    #[test]
    fn list_applies_extra_glob() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("ai-agents.html"), "x").unwrap();
        std::fs::write(tmp.path().join("pricing.html"), "x").unwrap();
        let store = store_in(tmp.path());
        let paths = store.list(tmp.path(), Some("ai-*.html")).unwrap();
        assert_eq!(paths.len(), 1);
    }
}
