//! sitemend — repair static site exports: find asset references, detect the
//! ones missing locally, re-fetch them from the origin, and apply rewrite rules.

pub mod documents;
pub mod fetch;
pub mod resolve;
pub mod rewrite;
pub mod scan;
pub mod types;

pub use documents::{DocumentSet, DEFAULT_EXTENSIONS};
pub use fetch::{normalize_origin, FetchOptions, Fetcher, BROWSER_USER_AGENT, DEFAULT_TIMEOUT_SECS};
pub use resolve::missing_assets;
pub use rewrite::{FileSelector, RewritePlan, RewriteRule, RewriteSummary, RuleDef};
pub use scan::{normalize_reference, Scanner, DEFAULT_PREFIX};
pub use types::*;
