//! Check for available updates without downloading anything.

use crate::commands::PromptSelector;
use crate::libs::config::ConfigStore;
use crate::libs::download::NoProgress;
use crate::libs::http::HttpFacility;
use crate::libs::messages::Message;
use crate::libs::orchestrator::Orchestrator;
use crate::libs::selector::PickFirst;
use crate::libs::view::View;
use crate::{msg_info, msg_print};
use anyhow::Result;
use clap::Args;
use std::io::IsTerminal;
use std::sync::Arc;

/// Command-line arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Application names or globs to check; all when omitted
    names: Vec<String>,
}

/// Executes the check command.
pub async fn cmd(args: CheckArgs) -> Result<()> {
    let store = ConfigStore::new();
    let snapshot = store.load()?;
    if snapshot.apps.is_empty() {
        msg_info!(Message::NoAppsConfigured);
        return Ok(());
    }

    let app_count = snapshot.apps.len();
    let http = Arc::new(HttpFacility::new(&snapshot.global)?);
    let selector: Arc<dyn crate::libs::selector::InteractiveSelector> =
        if std::io::stdin().is_terminal() {
            Arc::new(PromptSelector)
        } else {
            Arc::new(PickFirst)
        };
    let storage = store.storage().clone();
    let orchestrator =
        Orchestrator::with_parts(snapshot, storage, http, selector, Arc::new(NoProgress))?;

    if args.names.is_empty() {
        msg_info!(Message::CheckingApps(app_count));
    }
    let outcome = orchestrator.run(&args.names, true).await?;
    if outcome.checks.is_empty() {
        msg_info!(Message::NoAppsMatchedFilter);
        return Ok(());
    }

    msg_print!(Message::CheckResultsHeader, true);
    View::checks(&outcome.checks)?;

    let available = outcome.updates_available();
    if available > 0 {
        msg_info!(Message::DryRunNoDownloads(available));
    }

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
