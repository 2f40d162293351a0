//! Stash restore CLI entrypoint.

use clap::Parser;
use stash_archive::TarZstdExtractor;
use stash_core::Error;
use stash_net::{HttpDownloader, IndexClient};
use stash_restore::{KeyEvalPolicy, LogTracker, RestoreConfig, RestoreOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod config;

#[derive(Parser)]
#[command(name = "stash-restore")]
#[command(author, version, about = "Restore a build cache archive into the workspace", long_about = None)]
struct Cli {
    /// Newline-separated cache key templates, highest priority first.
    /// Defaults to the STASH_RESTORE_KEYS environment variable.
    #[arg(long)]
    key: Option<String>,

    /// Directory the archive is extracted into.
    #[arg(long, default_value = ".")]
    destination: PathBuf,

    /// Skip unusable key templates instead of failing the restore.
    #[arg(long)]
    skip_bad_keys: bool,

    /// Treat a cache miss as "nothing to restore" rather than a failure.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    soft_miss: bool,

    /// Enable debug logging (also: STASH_VERBOSE=true).
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let verbose =
        cli.verbose || std::env::var("STASH_VERBOSE").is_ok_and(|v| v == "true" || v == "1");
    init_tracing(verbose);

    let soft_miss = cli.soft_miss;
    match run(cli).await {
        Ok(()) => {
            info!("restore finished");
            ExitCode::SUCCESS
        }
        Err(Error::CacheMiss) if soft_miss => {
            warn!("no cache archive found for the provided keys, nothing to restore");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "restore failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> stash_core::Result<()> {
    let raw_keys = match cli.key {
        Some(raw) => raw,
        None => std::env::var("STASH_RESTORE_KEYS").unwrap_or_default(),
    };
    let keys = config::parse_keys(&raw_keys)?;
    let service = config::ServiceConfig::from_env()?;
    tracing::debug!(?service, key_count = keys.len(), "loaded configuration");

    let ctx = config::build_context_from_env();

    let policy = if cli.skip_bad_keys {
        KeyEvalPolicy::SkipKey
    } else {
        KeyEvalPolicy::FailFast
    };
    let restore_config = RestoreConfig::new(keys)?
        .with_destination(cli.destination)
        .with_key_eval_policy(policy);

    let orchestrator = RestoreOrchestrator::new(
        Arc::new(IndexClient::new(
            service.api_base_url.expose(),
            service.api_access_token.clone(),
        )),
        Arc::new(HttpDownloader::new()),
        Arc::new(TarZstdExtractor::new()),
        Arc::new(LogTracker),
        restore_config,
    );

    // Ctrl-C aborts the in-flight attempt; extraction already under way is
    // allowed to finish its current member.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling restore");
            signal_cancel.cancel();
        }
    });

    orchestrator.run_with_cancellation(&ctx, cancel).await
}
