//! Forget an application.
//!
//! Removes only the stored document; downloaded files and symlinks stay on
//! disk untouched.

use crate::libs::config::ConfigStore;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Command-line arguments for removing an application.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Application to remove
    name: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

/// Executes the remove command.
pub fn cmd(args: RemoveArgs) -> Result<()> {
    let store = ConfigStore::new();
    let snapshot = store.load()?;
    let Some(app) = snapshot.find(&args.name) else {
        msg_bail_anyhow!(Message::AppNotFound(args.name));
    };
    let name = app.name.clone();

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmRemoveApp(name.clone()).to_string())
            .default(false)
            .interact()?;
        if !confirmed {
            msg_info!(Message::RemoveCancelled);
            return Ok(());
        }
    }

    store.remove_app(&name)?;
    msg_success!(Message::AppRemoved(name));
    Ok(())
}
