//! `sitemend missing` — list references with no file under the export root.

use anyhow::Result;

use super::{print_paths, Workspace};

pub fn run(ws: &Workspace, json: bool) -> Result<()> {
    let missing = ws.missing()?;
    if missing.is_empty() && !json {
        eprintln!("No missing assets under {}", ws.root.display());
        return Ok(());
    }
    print_paths(&missing, "missing", json)
}
