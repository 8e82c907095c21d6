//! Configuration resolution: explicit flag, then environment, then default.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Environment variable naming the origin to re-fetch from.
pub const ORIGIN_ENV: &str = "SITEMEND_ORIGIN";

/// Environment variable naming the export root.
pub const ROOT_ENV: &str = "SITEMEND_ROOT";

/// Resolve the export root directory.
pub fn resolve_root(explicit: Option<&str>) -> PathBuf {
    resolve_root_from(explicit, std::env::var(ROOT_ENV).ok())
}

fn resolve_root_from(explicit: Option<&str>, env: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Some(env_path) = env.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(env_path);
    }

    PathBuf::from(".")
}

/// Resolve and validate the origin base URL.
pub fn resolve_origin(explicit: Option<&str>) -> Result<String> {
    resolve_origin_from(explicit, std::env::var(ORIGIN_ENV).ok())
}

fn resolve_origin_from(explicit: Option<&str>, env: Option<String>) -> Result<String> {
    let raw = explicit
        .map(str::to_string)
        .or_else(|| env.filter(|o| !o.trim().is_empty()))
        .ok_or_else(|| anyhow!("No origin given; pass --origin or set {ORIGIN_ENV}"))?;

    Ok(sitemend::normalize_origin(&raw)?)
}
