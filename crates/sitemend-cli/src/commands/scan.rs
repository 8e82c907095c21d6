//! `sitemend scan` — list every distinct asset reference in the export.

use anyhow::Result;

use super::{print_paths, Workspace};

pub fn run(ws: &Workspace, json: bool) -> Result<()> {
    let refs = ws.references()?;
    print_paths(&refs, "references", json)
}
