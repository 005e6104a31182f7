//! Download, verify, and rotate everything that has an update.

use crate::commands::PromptSelector;
use crate::libs::config::ConfigStore;
use crate::libs::download::ProgressReporter;
use crate::libs::http::HttpFacility;
use crate::libs::messages::Message;
use crate::libs::orchestrator::Orchestrator;
use crate::libs::selector::PickFirst;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::Arc;

/// Prints one line per 25% of download progress.
///
/// Downloads run concurrently, so per-file progress bars would interleave;
/// coarse percentage lines labeled by application stay readable.
struct ConsoleProgress {
    reported: Mutex<HashMap<String, u64>>,
}

impl ConsoleProgress {
    fn new() -> Self {
        Self {
            reported: Mutex::new(HashMap::new()),
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_progress(&self, app_name: &str, downloaded: u64, total: Option<u64>) {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let quarter = downloaded * 4 / total;
        let mut reported = self.reported.lock();
        let last = reported.entry(app_name.to_string()).or_insert(0);
        if quarter > *last {
            *last = quarter;
            msg_info!(Message::Custom(format!(
                "{}: {}%",
                app_name,
                (quarter * 25).min(100)
            )));
        }
    }
}

/// Command-line arguments for the update command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Application names or globs to update; all when omitted
    names: Vec<String>,

    /// Resolve and decide only, download nothing
    #[arg(long)]
    dry_run: bool,
}

/// Executes the update command.
pub async fn cmd(args: UpdateArgs) -> Result<()> {
    let store = ConfigStore::new();
    let snapshot = store.load()?;
    if snapshot.apps.is_empty() {
        msg_info!(Message::NoAppsConfigured);
        return Ok(());
    }

    let http = Arc::new(HttpFacility::new(&snapshot.global)?);
    let selector: Arc<dyn crate::libs::selector::InteractiveSelector> =
        if std::io::stdin().is_terminal() {
            Arc::new(PromptSelector)
        } else {
            Arc::new(PickFirst)
        };
    let storage = store.storage().clone();
    let orchestrator = Orchestrator::with_parts(
        snapshot,
        storage,
        http,
        selector,
        Arc::new(ConsoleProgress::new()),
    )?;

    // Ctrl-C cancels in-flight downloads; rotations that already began
    // still run to completion.
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let outcome = orchestrator.run(&args.names, args.dry_run).await?;
    if outcome.checks.is_empty() {
        msg_info!(Message::NoAppsMatchedFilter);
        return Ok(());
    }

    msg_print!(Message::CheckResultsHeader, true);
    View::checks(&outcome.checks)?;

    let cancelled = outcome
        .checks
        .iter()
        .filter(|check| check.status == crate::libs::outcome::CheckStatus::Cancelled)
        .count();
    if cancelled > 0 {
        msg_warning!(Message::RunCancelled(cancelled));
    }

    if args.dry_run {
        msg_info!(Message::DryRunNoDownloads(outcome.updates_available()));
    } else if outcome.downloads.is_empty() {
        msg_success!(Message::NothingToDownload);
    } else {
        msg_print!(Message::DownloadResultsHeader, true);
        View::downloads(&outcome.downloads)?;
    }

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
