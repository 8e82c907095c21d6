//! Asset reference scanning over an explicit document collection.

use std::collections::BTreeSet;

use regex::Regex;

use crate::types::{AssetRef, Document, MendError, MendResult};

/// Prefix used by exports when none is configured.
pub const DEFAULT_PREFIX: &str = "uploads/";

/// Characters that end a reference: quotes, angle brackets, whitespace,
/// `&`, and parentheses.
const TERMINATORS: &str = r#"[^"'<>\s&()]*"#;

/// Extracts asset references rooted at one or more known prefixes.
#[derive(Debug, Clone)]
pub struct Scanner {
    pattern: Regex,
    prefixes: Vec<String>,
}

impl Scanner {
    /// Build a scanner for the given prefixes (e.g. `"uploads/"`).
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> MendResult<Self> {
        let prefixes: Vec<String> = prefixes
            .iter()
            .map(|p| p.as_ref().trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if prefixes.is_empty() {
            return Err(MendError::Config(
                "at least one asset prefix is required".to_string(),
            ));
        }

        let alternation = prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!("(?:{alternation}){TERMINATORS}");

        let pattern = Regex::new(&source).map_err(|e| MendError::InvalidPattern {
            name: "asset prefix".to_string(),
            source: e,
        })?;

        Ok(Self { pattern, prefixes })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Normalized references in a single piece of text, in order of appearance.
    pub fn scan_text<'a>(&'a self, text: &'a str) -> impl Iterator<Item = AssetRef> + 'a {
        self.pattern
            .find_iter(text)
            .filter_map(|m| AssetRef::parse(m.as_str()))
    }

    /// Distinct normalized references across all documents.
    pub fn scan<'a, I>(&self, documents: I) -> BTreeSet<AssetRef>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut refs = BTreeSet::new();
        for doc in documents {
            let before = refs.len();
            refs.extend(self.scan_text(&doc.content));
            tracing::debug!(
                "{}: {} new reference(s)",
                doc.path.display(),
                refs.len() - before
            );
        }
        refs
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(&[DEFAULT_PREFIX]).expect("default prefix is a valid pattern")
    }
}

/// Normalize one raw reference string.
pub fn normalize_reference(raw: &str) -> Option<AssetRef> {
    AssetRef::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new("index.html", content)
    }

    fn paths(set: &BTreeSet<AssetRef>) -> Vec<&str> {
        set.iter().map(|r| r.as_str()).collect()
    }

    #[test]
    fn test_scan_img_with_cache_buster() {
        let scanner = Scanner::default();
        let refs = scanner.scan(&[doc(r#"<img src="uploads/site/123/photo.jpg?999">"#)]);
        assert_eq!(paths(&refs), vec!["uploads/site/123/photo.jpg"]);
    }

    #[test]
    fn test_scan_deduplicates_across_documents() {
        let scanner = Scanner::default();
        let docs = vec![
            doc(r#"<img src="uploads/img.png?1771438535"><img src="uploads/img.png">"#),
            Document::new("style.css", "body { background: url(uploads/img.png); }"),
        ];
        let refs = scanner.scan(&docs);
        assert_eq!(paths(&refs), vec!["uploads/img.png"]);
    }

    #[test]
    fn test_scan_stops_at_terminators() {
        let scanner = Scanner::default();
        let text = concat!(
            r#"<a href='uploads/a.pdf'>"#,
            r#"<img src="uploads/b.png"/>"#,
            "url(uploads/c.woff2) ",
            "uploads/d.js&v=2 ",
            "<p>uploads/e.txt</p> ",
            "uploads/f.svg\nnext",
        );
        let found: Vec<String> = scanner.scan_text(text).map(|r| r.to_string()).collect();
        assert_eq!(
            found,
            vec![
                "uploads/a.pdf",
                "uploads/b.png",
                "uploads/c.woff2",
                "uploads/d.js",
                "uploads/e.txt",
                "uploads/f.svg",
            ]
        );
    }

    #[test]
    fn test_scan_multiple_prefixes() {
        let scanner = Scanner::new(&["uploads/", "/static/"]).unwrap();
        assert_eq!(scanner.prefixes(), ["uploads/", "static/"]);
        let refs = scanner.scan(&[doc(
            r#"<script src="/static/app.js?3"></script><img src="uploads/x.gif">"#,
        )]);
        assert_eq!(paths(&refs), vec!["static/app.js", "uploads/x.gif"]);
    }

    #[test]
    fn test_prefix_is_literal() {
        let scanner = Scanner::new(&["up.loads/"]).unwrap();
        let refs = scanner.scan(&[doc("upXloads/a.png up.loads/b.png")]);
        assert_eq!(paths(&refs), vec!["up.loads/b.png"]);
    }

    #[test]
    fn test_empty_prefix_list_rejected() {
        let empty: [&str; 0] = [];
        assert!(Scanner::new(&empty).is_err());
        assert!(Scanner::new(&["/"]).is_err());
    }

    #[test]
    fn test_scan_skips_traversal() {
        let scanner = Scanner::default();
        let refs = scanner.scan(&[doc(r#"<img src="uploads/../../secret.png">"#)]);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_normalize_reference() {
        assert_eq!(
            normalize_reference("uploads/a.png?v=1").map(|r| r.to_string()),
            Some("uploads/a.png".to_string())
        );
    }
}
