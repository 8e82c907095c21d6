//! `sitemend rewrite` — apply an ordered rule list to the export's documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use sitemend::{RewritePlan, RewriteSummary};

use super::Workspace;

pub fn run(ws: &Workspace, rules: &Path, dry_run: bool, json: bool) -> Result<Vec<RewriteSummary>> {
    let plan = RewritePlan::load(rules)
        .with_context(|| format!("Failed to load rewrite rules from {}", rules.display()))?;

    let mut docs = ws.load_documents()?;
    let summaries = plan.apply_all(&mut docs);

    if !dry_run {
        let changed: Vec<PathBuf> = summaries.iter().map(|s| s.path.clone()).collect();
        let written = docs
            .write_changed(&changed)
            .context("Failed to write rewritten documents")?;
        tracing::info!("Wrote {written} document(s)");
    }

    if json {
        let value = serde_json::json!({
            "dry_run": dry_run,
            "documents": summaries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for summary in &summaries {
            let rel = summary.path.strip_prefix(&ws.root).unwrap_or(&summary.path);
            let hits = summary
                .hits
                .iter()
                .map(|(name, n)| format!("{name}={n}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("{}: {hits}", rel.display());
        }
        let verb = if dry_run { "Would change" } else { "Changed" };
        println!("{verb}: {} document(s)", summaries.len());
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Workspace, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(
            site.join("index.html"),
            r#"<a href="https://old.example.org/about">About</a>"#,
        )
        .unwrap();
        let rules = dir.path().join("rules.json");
        std::fs::write(
            &rules,
            r#"{"rules":[{"name":"relative-links","pattern":"https://old\\.example\\.org/","replacement":"/"}]}"#,
        )
        .unwrap();
        let ws = Workspace {
            root: site,
            prefixes: vec!["uploads/".into()],
            extensions: vec!["html".into()],
        };
        (dir, ws, rules)
    }

    #[test]
    fn test_rewrite_writes_changes() {
        let (_dir, ws, rules) = setup();
        let summaries = run(&ws, &rules, false, true).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(
            std::fs::read_to_string(ws.root.join("index.html")).unwrap(),
            r#"<a href="/about">About</a>"#
        );
    }

    #[test]
    fn test_rewrite_dry_run_leaves_files() {
        let (_dir, ws, rules) = setup();
        let summaries = run(&ws, &rules, true, true).unwrap();
        assert_eq!(summaries[0].total(), 1);
        assert!(std::fs::read_to_string(ws.root.join("index.html"))
            .unwrap()
            .contains("old.example.org"));
    }

    #[test]
    fn test_missing_rules_file() {
        let (dir, ws, _) = setup();
        let err = run(&ws, &dir.path().join("nope.json"), false, false).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load rewrite rules"));
    }
}
