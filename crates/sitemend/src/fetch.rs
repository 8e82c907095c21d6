//! Re-fetching missing assets from the original origin.
//!
//! One GET per missing path, written verbatim to the same relative path under
//! the export root. Failures are recorded and never abort the batch; there is
//! no retry, since an origin that no longer serves a file will not start again.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::documents::PARTIAL_SUFFIX;
use crate::types::{AssetRef, FetchOutcome, FetchRecord, FetchReport, MendError, MendResult};

/// Browser identification sent with every request. Some origins reject
/// default HTTP client user agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Per-request timeout used when none is given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Settings for a fetch batch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Origin base URL, e.g. `https://example.org`.
    pub origin: String,
    pub timeout: Duration,
    /// Downloads in flight at once; 1 means strictly sequential.
    pub concurrency: usize,
    /// Only plan the requests, touch neither network nor disk.
    pub dry_run: bool,
    pub user_agent: String,
}

impl FetchOptions {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: 1,
            dry_run: false,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Downloads missing assets from an origin into an export root.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    origin: String,
    concurrency: usize,
    dry_run: bool,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> MendResult<Self> {
        let origin = normalize_origin(&options.origin)?;

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            origin,
            concurrency: options.concurrency.max(1),
            dry_run: options.dry_run,
        })
    }

    /// Normalized origin, without a trailing slash.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Remote URL of an asset: `origin + "/" + path`.
    pub fn asset_url(&self, path: &AssetRef) -> String {
        format!("{}/{}", self.origin, path)
    }

    /// Fetch a single asset into `root`. Never fails; errors become a
    /// [`FetchOutcome::Failed`] record.
    pub async fn fetch_one(&self, path: &AssetRef, root: &Path) -> FetchRecord {
        let url = self.asset_url(path);

        let outcome = if self.dry_run {
            FetchOutcome::Planned { url }
        } else {
            match self.download(&url, &path.local_path(root)).await {
                Ok(bytes) => {
                    tracing::info!("Fetched {path} ({bytes} bytes)");
                    FetchOutcome::Fetched { bytes }
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {path}: {e}");
                    FetchOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        FetchRecord {
            path: path.clone(),
            outcome,
        }
    }

    /// Fetch every path, reporting each record through `on_record` as it
    /// completes. The returned report is ordered by path.
    pub async fn fetch_all<F>(&self, paths: &[AssetRef], root: &Path, mut on_record: F) -> FetchReport
    where
        F: FnMut(&FetchRecord),
    {
        let unique: BTreeSet<&AssetRef> = paths.iter().collect();
        tracing::info!(
            "Fetching {} asset(s) from {} (concurrency {})",
            unique.len(),
            self.origin,
            self.concurrency
        );

        let mut report = FetchReport::default();
        let mut pending = stream::iter(unique)
            .map(|path| self.fetch_one(path, root))
            .buffer_unordered(self.concurrency);

        while let Some(record) = pending.next().await {
            on_record(&record);
            report.push(record);
        }

        report.sort();
        let (ok, failed) = report.tally();
        tracing::info!("Fetch complete: {ok} fetched, {failed} failed");
        report
    }

    async fn download(&self, url: &str, dest: &Path) -> MendResult<u64> {
        tracing::debug!("GET {url}");
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MendError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(dest);
        match stream_body(resp, &partial).await {
            Ok(written) => {
                tokio::fs::rename(&partial, dest).await?;
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

/// Copy the response body chunk by chunk into `partial`.
async fn stream_body(mut resp: reqwest::Response, partial: &Path) -> MendResult<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Validate an origin URL and strip trailing slashes.
pub fn normalize_origin(origin: &str) -> MendResult<String> {
    let trimmed = origin.trim().trim_end_matches('/');

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| MendError::InvalidOrigin(format!("{origin}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(MendError::InvalidOrigin(format!(
            "{origin}: scheme must be http or https"
        )));
    }
    if parsed.host_str().is_none() {
        return Err(MendError::InvalidOrigin(format!("{origin}: missing host")));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(MendError::InvalidOrigin(format!(
            "{origin}: must not carry a query or fragment"
        )));
    }

    Ok(trimmed.to_string())
}
