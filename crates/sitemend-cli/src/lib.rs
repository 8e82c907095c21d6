//! sitemend CLI — repair static site exports from the command line.

pub mod commands;
pub mod config;

pub use commands::Workspace;
pub use config::{resolve_origin, resolve_root};
