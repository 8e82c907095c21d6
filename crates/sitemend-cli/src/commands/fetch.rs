//! `sitemend fetch` — download missing assets from the origin.

use std::time::Duration;

use anyhow::Result;

use sitemend::{FetchOptions, FetchOutcome, FetchRecord, FetchReport, Fetcher};

use super::Workspace;

/// Options for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub origin: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub dry_run: bool,
}

/// Resolve missing assets and fetch them, printing one line per attempt and
/// a final tally. Individual failures never make this return an error.
pub async fn run(ws: &Workspace, args: FetchArgs, json: bool) -> Result<FetchReport> {
    let missing = ws.missing()?;

    let mut options = FetchOptions::new(args.origin);
    options.timeout = Duration::from_secs(args.timeout_secs);
    options.concurrency = args.concurrency;
    options.dry_run = args.dry_run;
    let fetcher = Fetcher::new(options)?;

    if missing.is_empty() {
        tracing::info!("Nothing to fetch");
    }

    let report = fetcher
        .fetch_all(&missing, &ws.root, |record| {
            if !json {
                println!("{}", format_record(record));
            }
        })
        .await;

    if json {
        let value = serde_json::json!({
            "origin": fetcher.origin(),
            "fetched": report.succeeded(),
            "failed": report.failed(),
            "records": report.records,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", format_tally(&report, args.dry_run));
    }

    Ok(report)
}

/// One operator-facing line for a fetch attempt.
pub fn format_record(record: &FetchRecord) -> String {
    match &record.outcome {
        FetchOutcome::Fetched { bytes } => format!("[OK] {} ({bytes} bytes)", record.path),
        FetchOutcome::Failed { reason } => format!("[!!] {}: {reason}", record.path),
        FetchOutcome::Planned { url } => format!("[--] {} <- {url}", record.path),
    }
}

/// Final summary line.
pub fn format_tally(report: &FetchReport, dry_run: bool) -> String {
    if dry_run {
        return format!("Planned: {}", report.records.len());
    }
    let (ok, failed) = report.tally();
    format!("Fetched: {ok}  Failed: {failed}")
}
