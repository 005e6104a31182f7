//! Change stored settings of an application.
//!
//! Every flag rewrites one field of the stored document; validation reruns
//! before anything is persisted.

use crate::libs::config::{ChecksumConfig, ConfigStore};
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_success};
use anyhow::Result;
use clap::Args;

/// Command-line arguments for editing an application.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Application to edit
    name: String,

    /// New upstream URL
    #[arg(long)]
    url: Option<String>,

    /// New download directory
    #[arg(long, short)]
    download_dir: Option<String>,

    /// New asset filename pattern (regex)
    #[arg(long)]
    pattern: Option<String>,

    /// New version pattern (regex)
    #[arg(long)]
    version_pattern: Option<String>,

    /// Enable the application
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Disable the application
    #[arg(long)]
    disable: bool,

    /// Track prereleases
    #[arg(long, conflicts_with = "no_prerelease")]
    prerelease: bool,

    /// Stop tracking prereleases
    #[arg(long)]
    no_prerelease: bool,

    /// Enable rotation
    #[arg(long, conflicts_with = "no_rotation")]
    rotation: bool,

    /// Disable rotation
    #[arg(long)]
    no_rotation: bool,

    /// Symlink path for the active version
    #[arg(long)]
    symlink_path: Option<String>,

    /// Old versions to retain (1-10)
    #[arg(long)]
    retain: Option<u32>,

    /// Require checksum verification to pass
    #[arg(long, conflicts_with = "no_checksum_required")]
    checksum_required: bool,

    /// Allow checksum mismatches with a warning
    #[arg(long)]
    no_checksum_required: bool,
}

/// Executes the edit command.
pub fn cmd(args: EditArgs) -> Result<()> {
    let store = ConfigStore::new();
    let snapshot = store.load()?;
    let Some(mut app) = snapshot.find(&args.name).cloned() else {
        msg_bail_anyhow!(Message::AppNotFound(args.name));
    };

    if let Some(url) = args.url {
        app.url = url;
        // A new source invalidates any previously probed variant.
        app.source_type = None;
    }
    if let Some(dir) = args.download_dir {
        app.download_dir = Some(dir);
    }
    if let Some(pattern) = args.pattern {
        app.pattern = Some(pattern);
    }
    if let Some(vp) = args.version_pattern {
        app.version_pattern = Some(vp);
    }
    if args.enable {
        app.enabled = true;
    }
    if args.disable {
        app.enabled = false;
    }
    if args.prerelease {
        app.prerelease = Some(true);
    }
    if args.no_prerelease {
        app.prerelease = Some(false);
    }
    if args.rotation {
        app.rotation_enabled = Some(true);
    }
    if args.no_rotation {
        app.rotation_enabled = Some(false);
    }
    if let Some(link) = args.symlink_path {
        app.symlink_path = Some(link);
    }
    if let Some(retain) = args.retain {
        app.retain_count = Some(retain);
    }
    if args.checksum_required || args.no_checksum_required {
        let mut checksum = app.checksum.clone().unwrap_or_default();
        checksum.required = args.checksum_required;
        app.checksum = Some(checksum);
    }

    store.save_app(&app)?;
    msg_success!(Message::AppUpdated(app.name));
    Ok(())
}
