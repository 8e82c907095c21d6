//! Subcommand implementations for the `sitemend` binary.

pub mod fetch;
pub mod missing;
pub mod rewrite;
pub mod scan;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};

use sitemend::{missing_assets, AssetRef, DocumentSet, Scanner};

/// The export being repaired and how to read it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub prefixes: Vec<String>,
    pub extensions: Vec<String>,
}

impl Workspace {
    pub fn load_documents(&self) -> Result<DocumentSet> {
        DocumentSet::load(&self.root, &self.extensions)
            .with_context(|| format!("Failed to read documents under {}", self.root.display()))
    }

    pub fn scanner(&self) -> Result<Scanner> {
        Ok(Scanner::new(&self.prefixes)?)
    }

    /// Distinct asset references across all documents.
    pub fn references(&self) -> Result<BTreeSet<AssetRef>> {
        let docs = self.load_documents()?;
        let refs = self.scanner()?.scan(&docs);
        tracing::info!(
            "Found {} distinct reference(s) in {} document(s)",
            refs.len(),
            docs.len()
        );
        Ok(refs)
    }

    /// References with no file under the root, sorted.
    pub fn missing(&self) -> Result<Vec<AssetRef>> {
        let refs = self.references()?;
        missing_assets(&refs, &self.root)
            .with_context(|| format!("Failed to check files under {}", self.root.display()))
    }
}

/// Print a list of paths, or a JSON object `{ key: [...], "count": n }`.
pub(crate) fn print_paths<'a, I>(paths: I, key: &str, json: bool) -> Result<()>
where
    I: IntoIterator<Item = &'a AssetRef>,
{
    let paths: Vec<&str> = paths.into_iter().map(|p| p.as_str()).collect();
    if json {
        let value = serde_json::json!({ key: paths, "count": paths.len() });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for p in &paths {
            println!("{p}");
        }
    }
    Ok(())
}
