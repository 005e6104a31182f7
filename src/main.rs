//! Main entry point for the appimage-updater application.
//!
//! Handles initialization of the tracing system, the host platform guard,
//! and delegation to the CLI handler for command execution.

use anyhow::Result;
use appimage_updater::commands::Cli;
use appimage_updater::libs::error::UpdateError;
use appimage_updater::libs::host::Host;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing only if debug mode is enabled so log output does
    // not clutter normal CLI usage.
    if env::var("APPIMAGE_UPDATER_DEBUG").is_ok() || env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "appimage_updater=debug".into()),
            )
            .init();
    }

    // AppImages are a linux-only format; refuse anything else up front.
    if let Err(err) = Host::snapshot() {
        eprintln!("❌ {err}");
        std::process::exit(err.exit_code());
    }

    if let Err(err) = Cli::menu().await {
        // Last-resort catch: a message and a typed exit code, no backtrace.
        eprintln!("❌ {err:#}");
        let code = err
            .downcast_ref::<UpdateError>()
            .map(UpdateError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
    Ok(())
}
