//! Interactive setup of the global configuration.
//!
//! Walks through the transport settings and the defaults applied to new
//! applications, pre-filling current values, and saves the result.

use crate::libs::config::{ConfigStore, GlobalConfig, CONFIG_FILE_NAME};
use crate::libs::messages::Message;
use crate::msg_success;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

/// Executes the init command.
pub fn cmd() -> Result<()> {
    let store = ConfigStore::new();
    let mut global = store.load().map(|s| s.global).unwrap_or_default();

    global.concurrent_downloads = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptConcurrentDownloads.to_string())
        .default(global.concurrent_downloads)
        .validate_with(|value: &u32| {
            if (1..=10).contains(value) {
                Ok(())
            } else {
                Err("must be between 1 and 10")
            }
        })
        .interact_text()?;

    global.timeout_seconds = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptTimeoutSeconds.to_string())
        .default(global.timeout_seconds)
        .validate_with(|value: &u64| {
            if (5..=300).contains(value) {
                Ok(())
            } else {
                Err("must be between 5 and 300")
            }
        })
        .interact_text()?;

    global.user_agent = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptUserAgent.to_string())
        .default(global.user_agent.clone())
        .interact_text()?;

    let download_dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptDownloadDir.to_string())
        .default(
            global
                .defaults
                .download_dir
                .clone()
                .unwrap_or_else(|| "~/Applications".to_string()),
        )
        .interact_text()?;
    global.defaults.download_dir = Some(download_dir).filter(|d| !d.trim().is_empty());

    global.defaults.auto_subdir = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptAutoSubdir.to_string())
        .default(global.defaults.auto_subdir)
        .interact()?;

    global.defaults.rotation_enabled = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptRotationEnabled.to_string())
        .default(global.defaults.rotation_enabled)
        .interact()?;

    global.defaults.retain_count = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptRetainCount.to_string())
        .default(global.defaults.retain_count)
        .validate_with(|value: &u32| {
            if (1..=10).contains(value) {
                Ok(())
            } else {
                Err("must be between 1 and 10")
            }
        })
        .interact_text()?;

    global.defaults.checksum_required = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptChecksumRequired.to_string())
        .default(global.defaults.checksum_required)
        .interact()?;

    global.defaults.prerelease = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptPrerelease.to_string())
        .default(global.defaults.prerelease)
        .interact()?;

    save(&store, &global)
}

fn save(store: &ConfigStore, global: &GlobalConfig) -> Result<()> {
    store.save_global(global)?;
    let path = store.storage().base().join(CONFIG_FILE_NAME);
    msg_success!(Message::ConfigInitialized(path.display().to_string()));
    Ok(())
}
