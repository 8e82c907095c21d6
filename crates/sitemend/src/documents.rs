//! Loading and persisting the exported document collection.

use std::path::{Path, PathBuf};

use crate::types::{Document, MendResult};

/// Extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "htm", "css"];

/// Suffix of in-flight download files.
pub(crate) const PARTIAL_SUFFIX: &str = "part";

/// An ordered collection of exported text documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    /// Build a set from in-memory documents, ordered by path.
    pub fn from_documents(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Self { documents }
    }

    /// Recursively read every document under `root` with a matching extension.
    ///
    /// Hidden directories are not descended into. Files that are not valid
    /// UTF-8 are skipped.
    pub fn load<S: AsRef<str>>(root: &Path, extensions: &[S]) -> MendResult<Self> {
        let extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let mut files = Vec::new();
        collect_files(root, &extensions, &mut files)?;

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let bytes = std::fs::read(&path)?;
            match String::from_utf8(bytes) {
                Ok(content) => documents.push(Document { path, content }),
                Err(_) => tracing::warn!("Skipping non UTF-8 document: {}", path.display()),
            }
        }

        tracing::info!("Loaded {} document(s) from {}", documents.len(), root.display());
        Ok(Self::from_documents(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.documents.iter_mut()
    }

    /// Write back the documents whose paths are listed in `changed`.
    pub fn write_changed(&self, changed: &[PathBuf]) -> MendResult<usize> {
        let mut written = 0;
        for doc in self.documents.iter().filter(|d| changed.contains(&d.path)) {
            std::fs::write(&doc.path, doc.content.as_bytes())?;
            tracing::debug!("Wrote {}", doc.path.display());
            written += 1;
        }
        Ok(written)
    }
}

impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> MendResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden {
                collect_files(&path, extensions, out)?;
            }
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext {
            Some(ext) if ext == PARTIAL_SUFFIX => {}
            Some(ext) if extensions.contains(&ext) => out.push(path),
            _ => {}
        }
    }
    Ok(())
}
