//! Console table rendering for application lists and run results.
//!
//! The core returns typed results; this is the only place they are turned
//! into tables for the terminal.

use crate::libs::config::{ApplicationConfig, ConfigSnapshot, ResolvedApp};
use crate::libs::formatter::{format_duration, format_size};
use crate::libs::outcome::{CheckResult, ChecksumOutcome, DownloadResult};
use anyhow::Result;
use prettytable::{format, row, Table};

pub struct View;

impl View {
    fn table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    /// Configured applications overview.
    pub fn apps(snapshot: &ConfigSnapshot) -> Result<()> {
        let mut table = Self::table();
        table.set_titles(row!["Name", "Source", "Enabled", "URL"]);
        for app in &snapshot.apps {
            let source = app
                .source_type
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| if app.direct { "direct".into() } else { "auto".into() });
            table.add_row(row![
                app.name,
                source,
                if app.enabled { "yes" } else { "no" },
                app.url
            ]);
        }
        table.printstd();
        Ok(())
    }

    /// Full effective configuration of one application.
    pub fn app_details(app: &ApplicationConfig, resolved: &ResolvedApp) -> Result<()> {
        let mut table = Self::table();
        table.set_titles(row!["Field", "Value"]);
        table.add_row(row!["name", resolved.name]);
        table.add_row(row!["url", resolved.url]);
        let source = app
            .source_type
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| if resolved.direct { "direct".into() } else { "auto".into() });
        table.add_row(row!["source", source]);
        table.add_row(row!["enabled", resolved.enabled]);
        table.add_row(row!["pattern", resolved.pattern.as_str()]);
        table.add_row(row![
            "version pattern",
            resolved
                .version_pattern
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "-".into())
        ]);
        table.add_row(row!["prerelease", resolved.prerelease]);
        table.add_row(row!["download dir", resolved.download_dir.display()]);
        table.add_row(row!["rotation", resolved.rotation_enabled]);
        table.add_row(row!["retain count", resolved.retain_count]);
        table.add_row(row![
            "symlink",
            resolved
                .symlink_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".into())
        ]);
        table.add_row(row![
            "checksum",
            format!(
                "{} ({}, {})",
                if resolved.checksum.enabled { "on" } else { "off" },
                resolved.checksum.algorithm.label(),
                if resolved.checksum.required {
                    "required"
                } else {
                    "optional"
                }
            )
        ]);
        table.printstd();
        Ok(())
    }

    /// Check results, one row per application.
    pub fn checks(results: &[CheckResult]) -> Result<()> {
        let mut table = Self::table();
        table.set_titles(row!["Application", "Status", "Installed", "Latest", "Detail"]);
        for result in results {
            table.add_row(row![
                result.app_name,
                result.status.label(),
                result.current_version.as_deref().unwrap_or("-"),
                result.latest_version.as_deref().unwrap_or("-"),
                result.error.as_deref().unwrap_or("")
            ]);
        }
        table.printstd();
        Ok(())
    }

    /// Download results, one row per attempted download.
    pub fn downloads(results: &[DownloadResult]) -> Result<()> {
        let mut table = Self::table();
        table.set_titles(row!["Application", "Result", "Path", "Size", "Time", "Checksum"]);
        for result in results {
            let checksum = match result.checksum {
                ChecksumOutcome::Verified => "verified",
                ChecksumOutcome::Skipped => "skipped",
                ChecksumOutcome::Failed => "failed",
            };
            table.add_row(row![
                result.app_name,
                result
                    .error
                    .as_deref()
                    .unwrap_or("ok"),
                result
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".into()),
                result.size.map(format_size).unwrap_or_else(|| "-".into()),
                format_duration(result.duration),
                checksum
            ]);
        }
        table.printstd();
        Ok(())
    }
}
