//! MCPM CLI entry point
//!
//! Parses arguments, sets up logging, runs the selected command and maps failures to
//! a colored message and exit code (130 for cancellation, 1 otherwise).

use clap::Parser;
use mcpm_cli::cli;
use mcpm_cli::core::user_friendly_error;
use mcpm_cli::vault::MasterPasswordSession;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    let config = cli.build_config();
    config.apply_to_env();

    // --verbose/--quiet win over RUST_LOG
    let filter = match config.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let session = Arc::new(MasterPasswordSession::new());
    let result = cli.execute(Arc::clone(&session)).await;
    session.clear();

    if let Err(e) = result {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(error_ctx.exit_code());
    }
}
