//! sitemend — entry point.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use sitemend::{DEFAULT_EXTENSIONS, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS};
use sitemend_cli::commands::{self, fetch::FetchArgs, Workspace};
use sitemend_cli::config::{resolve_origin, resolve_root};

#[derive(Parser)]
#[command(
    name = "sitemend",
    about = "Repair missing uploads in a static site export",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Export root directory (defaults to $SITEMEND_ROOT, then ".").
    #[arg(long, global = true)]
    root: Option<String>,

    /// Asset path prefix to scan for. Can be repeated.
    #[arg(long = "prefix", global = true)]
    prefixes: Vec<String>,

    /// Document extension to scan. Can be repeated.
    #[arg(long = "ext", global = true)]
    extensions: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output results as JSON (machine-readable).
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every distinct asset reference found in the documents.
    Scan,

    /// List references with no file under the export root.
    Missing,

    /// Download missing references from the original origin.
    Fetch {
        /// Origin base URL (defaults to $SITEMEND_ORIGIN).
        #[arg(long)]
        origin: Option<String>,

        /// Per-request timeout in seconds.
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Downloads in flight at once.
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Print the URLs that would be requested, without downloading.
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply an ordered list of rewrite rules (JSON) to the documents.
    Rewrite {
        /// Path to the rules file.
        #[arg(long)]
        rules: PathBuf,

        /// Report replacements without writing files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   sitemend completions bash > ~/.local/share/bash-completion/completions/sitemend
    ///   sitemend completions zsh > ~/.zfunc/_sitemend
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

impl GlobalArgs {
    fn workspace(&self) -> Workspace {
        let prefixes = if self.prefixes.is_empty() {
            vec![DEFAULT_PREFIX.to_string()]
        } else {
            self.prefixes.clone()
        };
        let extensions = if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions.clone()
        };

        Workspace {
            root: resolve_root(self.root.as_deref()),
            prefixes,
            extensions,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.global.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.global.json;
    let ws = cli.global.workspace();

    match cli.command {
        Commands::Scan => commands::scan::run(&ws, json)?,

        Commands::Missing => commands::missing::run(&ws, json)?,

        Commands::Fetch {
            origin,
            timeout,
            concurrency,
            dry_run,
        } => {
            let origin = resolve_origin(origin.as_deref())?;
            tracing::info!("Root: {}", ws.root.display());
            tracing::info!("Origin: {origin}");
            let args = FetchArgs {
                origin,
                timeout_secs: timeout,
                concurrency,
                dry_run,
            };
            commands::fetch::run(&ws, args, json).await?;
        }

        Commands::Rewrite { rules, dry_run } => {
            commands::rewrite::run(&ws, &rules, dry_run, json)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sitemend", &mut std::io::stdout());
        }
    }

    Ok(())
}
