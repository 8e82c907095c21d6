//! Ordered, data-driven text rewrite rules for exported documents.
//!
//! A plan is a list of `{name, pattern, replacement, applies_to}` records
//! loaded from JSON and applied in declared order. Each rule sees the output
//! of the previous one.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::documents::DocumentSet;
use crate::types::{Document, MendError, MendResult};

/// Which documents a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSelector {
    #[default]
    All,
    Extension { ext: String },
    FileName { name: String },
}

impl FileSelector {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            FileSelector::All => true,
            FileSelector::Extension { ext } => doc
                .extension()
                .is_some_and(|e| e == ext.trim_start_matches('.').to_ascii_lowercase()),
            FileSelector::FileName { name } => doc.file_name() == Some(name.as_str()),
        }
    }
}

/// Serialized form of one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub applies_to: FileSelector,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    rules: Vec<RuleDef>,
}

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: String,
    pattern: Regex,
    replacement: String,
    pub applies_to: FileSelector,
}

impl RewriteRule {
    pub fn compile(def: RuleDef) -> MendResult<Self> {
        let pattern = Regex::new(&def.pattern).map_err(|e| MendError::InvalidPattern {
            name: def.name.clone(),
            source: e,
        })?;
        Ok(Self {
            name: def.name,
            pattern,
            replacement: def.replacement,
            applies_to: def.applies_to,
        })
    }

    /// Apply to `text`, returning the new text and the replacement count.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let count = self.pattern.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        let out = self
            .pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned();
        (out, count)
    }
}

/// Replacements made in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub path: PathBuf,
    /// `(rule name, replacement count)` for each rule that matched.
    pub hits: Vec<(String, usize)>,
}

impl RewriteSummary {
    pub fn total(&self) -> usize {
        self.hits.iter().map(|(_, n)| n).sum()
    }
}

/// Result of running a plan over one document.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub content: String,
    pub summary: RewriteSummary,
    changed: bool,
}

impl RewriteOutcome {
    /// Whether the text differs from the input, not merely whether a rule matched.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

/// An ordered list of rewrite rules.
#[derive(Debug, Clone, Default)]
pub struct RewritePlan {
    rules: Vec<RewriteRule>,
}

impl RewritePlan {
    pub fn new(defs: Vec<RuleDef>) -> MendResult<Self> {
        let rules = defs
            .into_iter()
            .map(RewriteRule::compile)
            .collect::<MendResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Parse `{"rules": [...]}`.
    pub fn from_json(json: &str) -> MendResult<Self> {
        let file: RulesFile = serde_json::from_str(json)?;
        Self::new(file.rules)
    }

    pub fn load(path: &Path) -> MendResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let plan = Self::from_json(&json)?;
        tracing::info!("Loaded {} rewrite rule(s) from {}", plan.len(), path.display());
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Run every applicable rule over `doc` in order.
    pub fn apply(&self, doc: &Document) -> RewriteOutcome {
        let mut content = doc.content.clone();
        let mut hits = Vec::new();

        for rule in self.rules.iter().filter(|r| r.applies_to.matches(doc)) {
            let (next, count) = rule.apply(&content);
            if count > 0 {
                tracing::debug!("{}: rule '{}' replaced {count}", doc.path.display(), rule.name);
                hits.push((rule.name.clone(), count));
                content = next;
            }
        }

        let changed = content != doc.content;
        RewriteOutcome {
            content,
            changed,
            summary: RewriteSummary {
                path: doc.path.clone(),
                hits,
            },
        }
    }

    /// Rewrite every document in place. Returns summaries for the changed ones.
    pub fn apply_all(&self, documents: &mut DocumentSet) -> Vec<RewriteSummary> {
        let mut changed = Vec::new();
        for doc in documents.iter_mut() {
            let outcome = self.apply(doc);
            if outcome.changed() {
                doc.content = outcome.content;
                changed.push(outcome.summary);
            }
        }
        tracing::info!("Rewrite rules changed {} document(s)", changed.len());
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "rules": [
            {
                "name": "absolute-uploads",
                "pattern": "https://cdn\\.example\\.org/(uploads/)",
                "replacement": "$1"
            },
            {
                "name": "drop-tracker",
                "pattern": "<script src=\"[^\"]*tracker\\.js\"></script>",
                "replacement": "",
                "applies_to": { "type": "extension", "ext": "html" }
            },
            {
                "name": "rename-uploads",
                "pattern": "uploads/",
                "replacement": "assets/",
                "applies_to": { "type": "file_name", "name": "site.css" }
            }
        ]
    }"#;

    #[test]
    fn test_rules_apply_in_order_with_selectors() {
        let plan = RewritePlan::from_json(RULES).unwrap();
        assert_eq!(plan.len(), 3);

        let html = Document::new(
            "index.html",
            r#"<img src="https://cdn.example.org/uploads/a.png"><script src="/t/tracker.js"></script>"#,
        );
        let out = plan.apply(&html);
        assert_eq!(out.content, r#"<img src="uploads/a.png">"#);
        assert_eq!(
            out.summary.hits,
            vec![
                ("absolute-uploads".to_string(), 1),
                ("drop-tracker".to_string(), 1)
            ]
        );

        // The css rule sees the output of the first rule.
        let css = Document::new("site.css", "url(https://cdn.example.org/uploads/b.png)");
        let out = plan.apply(&css);
        assert_eq!(out.content, "url(assets/b.png)");
        assert_eq!(out.summary.total(), 2);
    }

    #[test]
    fn test_unchanged_document() {
        let plan = RewritePlan::from_json(RULES).unwrap();
        let doc = Document::new("other.css", "body{}");
        let out = plan.apply(&doc);
        assert!(!out.changed());
        assert_eq!(out.content, "body{}");
    }

    #[test]
    fn test_identity_match_is_not_a_change() {
        let plan = RewritePlan::from_json(
            r#"{"rules":[{"name":"keep-uploads","pattern":"(uploads/)","replacement":"$1"}]}"#,
        )
        .unwrap();
        let out = plan.apply(&Document::new("index.html", "<img src=\"uploads/a.png\">"));
        assert_eq!(out.summary.total(), 1);
        assert!(!out.changed());
    }

    #[test]
    fn test_rerun_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<img src=\"https://cdn.example.org/uploads/a.png\">").unwrap();
        let plan = RewritePlan::from_json(
            r#"{"rules":[
                {"name":"absolute-uploads","pattern":"https://cdn\\.example\\.org/(uploads/)","replacement":"$1"},
                {"name":"keep-uploads","pattern":"(uploads/)","replacement":"$1"}
            ]}"#,
        )
        .unwrap();

        let mut docs = DocumentSet::load(dir.path(), &["html"]).unwrap();
        let first = plan.apply_all(&mut docs);
        assert_eq!(first, vec![RewriteSummary {
            path: index.clone(),
            hits: vec![("absolute-uploads".to_string(), 1), ("keep-uploads".to_string(), 1)],
        }]);
        assert_eq!(docs.write_changed(&[index]).unwrap(), 1);

        let mut docs = DocumentSet::load(dir.path(), &["html"]).unwrap();
        let summaries = plan.apply_all(&mut docs);
        assert!(summaries.is_empty());
        let changed: Vec<PathBuf> = summaries.iter().map(|s| s.path.clone()).collect();
        assert_eq!(docs.write_changed(&changed).unwrap(), 0);
    }

    #[test]
    fn test_invalid_pattern_names_rule() {
        let err = RewritePlan::from_json(
            r#"{"rules":[{"name":"broken","pattern":"(","replacement":""}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RewritePlan::from_json("{\"rules\": 3}"),
            Err(MendError::Rules(_))
        ));
    }

    #[test]
    fn test_apply_all_and_write_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<img src=\"https://cdn.example.org/uploads/a.png\">",
        )
        .unwrap();
        std::fs::write(dir.path().join("about.html"), "<p>hi</p>").unwrap();

        let plan = RewritePlan::from_json(RULES).unwrap();
        let mut docs = DocumentSet::load(dir.path(), &["html"]).unwrap();
        let summaries = plan.apply_all(&mut docs);
        assert_eq!(summaries.len(), 1);

        let changed: Vec<PathBuf> = summaries.iter().map(|s| s.path.clone()).collect();
        assert_eq!(docs.write_changed(&changed).unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "<img src=\"uploads/a.png\">"
        );
    }

    #[test]
    fn test_selector_extension_case_insensitive() {
        let sel = FileSelector::Extension { ext: ".HTML".into() };
        assert!(sel.matches(&Document::new("a/INDEX.Html", "")));
        assert!(!sel.matches(&Document::new("a/site.css", "")));
    }
}
