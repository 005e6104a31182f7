//! Per-application results produced by the orchestrator and download engine.

use crate::libs::config::ChecksumAlgorithm;
use crate::libs::release::{Asset, ChecksumAsset};
use std::path::PathBuf;
use std::time::Duration;

/// The decision to download one asset for one application.
#[derive(Debug, Clone)]
pub struct UpdateCandidate {
    pub app_name: String,
    pub current_version: Option<String>,
    pub latest_version: String,
    pub asset: Asset,
    pub checksum_asset: Option<ChecksumAsset>,
    pub is_newer: bool,
    /// Short explanation of how the decision was reached.
    pub reason: String,
}

/// Outcome category of a version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    UpToDate,
    UpdateAvailable,
    Disabled,
    Cancelled,
    Error,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::UpToDate => "up-to-date",
            CheckStatus::UpdateAvailable => "update-available",
            CheckStatus::Disabled => "disabled",
            CheckStatus::Cancelled => "cancelled",
            CheckStatus::Error => "error",
        }
    }
}

/// Result of resolving and deciding for one application.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub app_name: String,
    pub current_version: Option<String>,
    pub latest_version: Option<String>,
    pub status: CheckStatus,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn error(app_name: impl Into<String>, error: impl Into<String>) -> CheckResult {
        CheckResult {
            app_name: app_name.into(),
            current_version: None,
            latest_version: None,
            status: CheckStatus::Error,
            error: Some(error.into()),
        }
    }

    pub fn disabled(app_name: impl Into<String>) -> CheckResult {
        CheckResult {
            app_name: app_name.into(),
            current_version: None,
            latest_version: None,
            status: CheckStatus::Disabled,
            error: None,
        }
    }

    pub fn cancelled(app_name: impl Into<String>) -> CheckResult {
        CheckResult {
            app_name: app_name.into(),
            current_version: None,
            latest_version: None,
            status: CheckStatus::Cancelled,
            error: None,
        }
    }
}

/// How checksum verification ended for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumOutcome {
    Verified,
    Skipped,
    Failed,
}

/// Detailed checksum verification record.
#[derive(Debug, Clone)]
pub struct ChecksumResult {
    pub verified: bool,
    pub algorithm: ChecksumAlgorithm,
    pub expected: String,
    pub actual: String,
    pub error: Option<String>,
}

/// Result of running the download pipeline for one application.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub app_name: String,
    /// Final installed path (the `.current` file when rotation is enabled).
    pub path: Option<PathBuf>,
    pub size: Option<u64>,
    pub duration: Duration,
    pub checksum: ChecksumOutcome,
    pub error: Option<String>,
}

impl DownloadResult {
    pub fn failure(app_name: impl Into<String>, error: impl Into<String>) -> DownloadResult {
        DownloadResult {
            app_name: app_name.into(),
            path: None,
            size: None,
            duration: Duration::ZERO,
            checksum: ChecksumOutcome::Skipped,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
