//! Register a new application.
//!
//! Derives a sensible asset pattern from the upstream release listing when
//! none is given, validates the resulting document, and writes it to the
//! store.

use crate::api::Repository;
use crate::libs::config::{
    ApplicationConfig, ChecksumConfig, ConfigStore, SourceType,
};
use crate::libs::messages::Message;
use crate::libs::pattern;
use crate::{msg_success, msg_info};
use anyhow::Result;
use clap::Args;

/// Command-line arguments for registering an application.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique application name (case-insensitive)
    name: String,

    /// Upstream source: forge repository URL, download page, or file URL
    url: String,

    /// Directory to download into (absolute, ~-relative, or relative to the
    /// global download root)
    #[arg(long, short)]
    download_dir: Option<String>,

    /// Explicit source type instead of auto-detection
    #[arg(long, value_parser = parse_source_type)]
    source_type: Option<SourceType>,

    /// Treat the URL as a single downloadable file
    #[arg(long)]
    direct: bool,

    /// Asset filename pattern (regex); derived from upstream when omitted
    #[arg(long)]
    pattern: Option<String>,

    /// Regex filtering release tags and extracting versions
    #[arg(long)]
    version_pattern: Option<String>,

    /// Track prereleases for this application
    #[arg(long)]
    prerelease: bool,

    /// Keep previous versions and maintain a stable symlink
    #[arg(long)]
    rotation: bool,

    /// Symlink path for the active version (must end in .AppImage)
    #[arg(long)]
    symlink_path: Option<String>,

    /// Old versions to retain when rotating (1-10)
    #[arg(long)]
    retain: Option<u32>,

    /// Fail downloads whose checksum does not verify
    #[arg(long)]
    checksum_required: bool,

    /// Skip checksum verification entirely
    #[arg(long)]
    no_checksum: bool,

    /// Register the application disabled
    #[arg(long)]
    disabled: bool,
}

fn parse_source_type(value: &str) -> Result<SourceType, String> {
    match value {
        "forge-api-github" | "github" => Ok(SourceType::GithubApi),
        "forge-api-gitlab" | "gitlab" => Ok(SourceType::GitlabApi),
        "sourceforge" => Ok(SourceType::SourceForge),
        "direct" => Ok(SourceType::Direct),
        "dynamic" => Ok(SourceType::Dynamic),
        other => Err(format!("unknown source type '{other}'")),
    }
}

/// Executes the add command.
pub async fn cmd(args: AddArgs) -> Result<()> {
    let store = ConfigStore::new();
    let snapshot = store.load()?;

    let mut app = ApplicationConfig::new(args.name.clone(), args.url.clone());
    app.source_type = args.source_type;
    app.direct = args.direct;
    app.download_dir = args.download_dir;
    app.pattern = args.pattern;
    app.version_pattern = args.version_pattern;
    app.enabled = !args.disabled;
    if args.prerelease {
        app.prerelease = Some(true);
    }
    if args.rotation {
        app.rotation_enabled = Some(true);
    }
    app.symlink_path = args.symlink_path;
    app.retain_count = args.retain;
    if args.no_checksum {
        app.checksum = Some(ChecksumConfig {
            enabled: false,
            ..ChecksumConfig::default()
        });
    } else if args.checksum_required {
        app.checksum = Some(ChecksumConfig {
            required: true,
            ..ChecksumConfig::default()
        });
    }

    // Users often paste a release or tag page; store the repository root.
    if let Ok(parsed) = url::Url::parse(&app.url) {
        if crate::api::github::GitHubClient::detect_url(&parsed) {
            if let Some(normalized) = crate::api::github::GitHubClient::normalize_url(&parsed) {
                app.url = normalized;
            }
        }
    }

    // Derive the asset pattern from what upstream actually publishes;
    // fall back to a name-based pattern when the source is unreachable.
    if app.pattern.is_none() {
        app.pattern = Some(derive_pattern(&snapshot, &store, &app).await);
    }

    store.add_app(&app)?;
    msg_success!(Message::AppAdded(app.name));
    Ok(())
}

async fn derive_pattern(
    snapshot: &crate::libs::config::ConfigSnapshot,
    store: &ConfigStore,
    app: &ApplicationConfig,
) -> String {
    let derived = async {
        let resolved = snapshot.resolve(app).ok()?;
        let http = std::sync::Arc::new(
            crate::libs::http::HttpFacility::new(&snapshot.global).ok()?,
        );
        let repository =
            Repository::for_app(&http, &resolved, &snapshot.global, store.storage())
                .await
                .ok()?;
        let releases = repository
            .get_releases(&resolved, pattern::DEFAULT_RELEASE_SAMPLE)
            .await
            .ok()?;
        pattern::pattern_from_releases(&releases)
    }
    .await;

    match derived {
        Some(derived) => {
            msg_info!(Message::PatternDerived(derived.clone()));
            derived
        }
        None => {
            let fallback = pattern::pattern_from_name(&app.name);
            msg_info!(Message::PatternFallback(fallback.clone()));
            fallback
        }
    }
}
