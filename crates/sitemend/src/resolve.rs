//! Local gap detection: which referenced assets are absent under the export root.

use std::io;
use std::path::Path;

use crate::types::{AssetRef, MendResult};

/// Return the referenced paths that do not exist under `root`, sorted.
///
/// A filesystem error while checking fails the whole call, except for a
/// path component that is a file: such a path cannot exist and counts as
/// missing.
pub fn missing_assets<'a, I>(refs: I, root: &Path) -> MendResult<Vec<AssetRef>>
where
    I: IntoIterator<Item = &'a AssetRef>,
{
    let mut missing = Vec::new();
    let mut present = 0usize;

    for asset in refs {
        match asset.local_path(root).try_exists() {
            Ok(true) => present += 1,
            Ok(false) => missing.push(asset.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                tracing::debug!("{asset}: parent is not a directory");
                missing.push(asset.clone());
            }
            Err(e) => return Err(e.into()),
        }
    }

    missing.sort();
    missing.dedup();

    tracing::info!(
        "{} reference(s) present under {}, {} missing",
        present,
        root.display(),
        missing.len()
    );

    Ok(missing)
}
