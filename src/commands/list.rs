//! Overview of all configured applications.

use crate::libs::config::ConfigStore;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_info;
use anyhow::Result;

/// Executes the list command.
pub fn cmd() -> Result<()> {
    let snapshot = ConfigStore::new().load()?;
    if snapshot.apps.is_empty() {
        msg_info!(Message::NoAppsConfigured);
        return Ok(());
    }
    View::apps(&snapshot)
}
