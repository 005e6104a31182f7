//! Full effective configuration of one application.
//!
//! Displays the merged view the pipeline will actually use, with defaults
//! applied and paths resolved.

use crate::libs::config::ConfigStore;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_bail_anyhow;
use anyhow::Result;
use clap::Args;

/// Command-line arguments for the show command.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Application to show
    name: String,
}

/// Executes the show command.
pub fn cmd(args: ShowArgs) -> Result<()> {
    let snapshot = ConfigStore::new().load()?;
    let Some(app) = snapshot.find(&args.name) else {
        msg_bail_anyhow!(Message::AppNotFound(args.name));
    };
    let resolved = snapshot.resolve(app)?;
    View::app_details(app, &resolved)
}
