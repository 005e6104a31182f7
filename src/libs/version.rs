//! Version decision: what is installed, what is upstream, and whether the
//! upstream one is newer.
//!
//! The installed version is read from `.info` sidecar files when present
//! and extracted from filenames otherwise. Comparison prefers semantic
//! versioning with a lenient pre-parse; when either side refuses to parse,
//! string inequality combined with timestamps decides.

use crate::libs::config::ResolvedApp;
use crate::libs::error::UpdateError;
use crate::libs::outcome::UpdateCandidate;
use crate::libs::release::{Asset, Release};
use crate::libs::rotation::CURRENT_SUFFIX;
use chrono::{DateTime, Utc};
use regex::Regex;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Sidecar suffix recording the upstream version of a downloaded file.
pub const INFO_SUFFIX: &str = ".info";

/// Default family of version shapes recognized in tags and filenames:
/// semver-ish triples, date stamps, and nightly tags.
fn default_version_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // The pre-release suffix must contain a digit so platform words
            // like `-Linux` are not swallowed into the version.
            Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:[-+][A-Za-z.]*\d[A-Za-z0-9.]*)?)").unwrap(),
            Regex::new(r"(\d{4}[.\-_]\d{2}[.\-_]\d{2})").unwrap(),
            Regex::new(r"(?i)(nightly[-_]?\d*)").unwrap(),
        ]
    })
}

/// Extracts a version token from text using the app's version pattern when
/// set, else the default family.
pub fn extract_version(text: &str, version_pattern: Option<&Regex>) -> Option<String> {
    if let Some(pattern) = version_pattern {
        let captures = pattern.captures(text)?;
        let m = captures.get(1).or_else(|| captures.get(0))?;
        return Some(m.as_str().to_string());
    }
    for pattern in default_version_patterns() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1).or_else(|| captures.get(0)) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Lenient semver parse: strips a `v` prefix and pads missing components.
pub fn parse_lenient(version: &str) -> Option<Version> {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    if let Ok(parsed) = Version::parse(trimmed) {
        return Some(parsed);
    }
    // Two-component versions are common; pad before any pre-release part.
    let (core, tail) = match trimmed.find(['-', '+']) {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };
    let dots = core.matches('.').count();
    let padded = match dots {
        0 => format!("{core}.0.0{tail}"),
        1 => format!("{core}.0{tail}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Compares installed against latest.
///
/// Missing installed version counts as outdated. Semver decides when both
/// sides parse; otherwise plain string inequality combined with the
/// local file's mtime against the remote publication instant.
pub fn is_newer(
    current: Option<&str>,
    latest: &str,
    current_mtime: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
) -> bool {
    let current = match current {
        Some(current) => current,
        None => return true,
    };
    match (parse_lenient(current), parse_lenient(latest)) {
        (Some(installed), Some(remote)) => remote > installed,
        _ => {
            if current == latest {
                return false;
            }
            match (current_mtime, published_at) {
                (Some(local), Some(remote)) => remote > local,
                _ => true,
            }
        }
    }
}

/// Reads the `Version: <tag>` line from a sidecar file.
pub fn read_sidecar(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    text.lines().find_map(|line| {
        line.strip_prefix("Version:")
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
    })
}

/// Writes the sidecar for a downloaded file.
pub fn write_sidecar(file: &Path, tag: &str) -> Result<(), UpdateError> {
    let sidecar = sidecar_path(file);
    fs::write(&sidecar, format!("Version: {tag}\n"))
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", sidecar.display())))?;
    Ok(())
}

/// Sidecar path for a file: the filename with `.info` appended.
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(INFO_SUFFIX);
    PathBuf::from(name)
}

/// Resolves the installed version of an application from its download
/// directory.
///
/// Preference order: the rotation `.current` file's sidecar, then any
/// pattern-matching file with a sidecar, then version extraction from the
/// best-looking filename.
pub fn current_version(app: &ResolvedApp) -> Option<String> {
    let entries = list_matching_files(app);
    if entries.is_empty() {
        return None;
    }

    // Rotation's active file wins outright when its sidecar is readable.
    if let Some(current) = entries.iter().find(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(CURRENT_SUFFIX))
    }) {
        if let Some(version) = read_sidecar(&sidecar_path(current)) {
            return Some(version);
        }
    }

    // Otherwise gather (version, mtime) candidates from sidecars first and
    // filename extraction second.
    let mut candidates: Vec<(String, Option<DateTime<Utc>>)> = Vec::new();
    for path in &entries {
        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        if let Some(version) = read_sidecar(&sidecar_path(path)) {
            candidates.push((version, mtime));
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some(version) = extract_version(name, app.version_pattern.as_ref()) {
                candidates.push((version, mtime));
            }
        }
    }
    candidates.sort_by(|a, b| {
        let parsed_a = parse_lenient(&a.0);
        let parsed_b = parse_lenient(&b.0);
        parsed_b
            .cmp(&parsed_a)
            .then_with(|| b.1.cmp(&a.1))
    });
    candidates.into_iter().next().map(|(version, _)| version)
}

/// Modification instant of the newest pattern-matching file, used as the
/// local side of timestamp comparisons when versions do not parse.
pub fn newest_local_mtime(app: &ResolvedApp) -> Option<DateTime<Utc>> {
    list_matching_files(app)
        .iter()
        .filter_map(|path| {
            fs::metadata(path)
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from)
        })
        .max()
}

/// Files in the download directory matching the app pattern, sidecars
/// excluded.
fn list_matching_files(app: &ResolvedApp) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(&app.download_dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(INFO_SUFFIX) || name.ends_with(".partial") {
            continue;
        }
        if app.pattern.is_match(name) {
            files.push(path);
        }
    }
    files
}

/// A chosen release plus how the choice was made.
#[derive(Debug, Clone)]
pub enum ReleaseChoice {
    Stable(Release),
    /// Only prereleases exist upstream, so the latest one was accepted
    /// despite the prerelease setting being off.
    PrereleaseFallback(Release),
}

impl ReleaseChoice {
    pub fn release(&self) -> &Release {
        match self {
            ReleaseChoice::Stable(release) | ReleaseChoice::PrereleaseFallback(release) => release,
        }
    }
}

/// Picks the release to track from a listing ordered newest-first.
///
/// A release qualifies when at least one asset matches the app pattern and
/// its tag passes the version pattern filter. With prereleases disabled the
/// first qualifying stable release wins; when the whole window is
/// prerelease-only the latest qualifying prerelease is accepted and
/// flagged.
pub fn choose_release(releases: &[Release], app: &ResolvedApp) -> Option<ReleaseChoice> {
    let qualifies = |release: &Release| -> bool {
        if release.matching_assets(&app.pattern).is_empty() {
            return false;
        }
        match &app.version_pattern {
            Some(vp) => vp.is_match(&release.tag),
            None => true,
        }
    };

    if app.prerelease {
        return releases
            .iter()
            .find(|r| qualifies(r))
            .cloned()
            .map(ReleaseChoice::Stable);
    }
    if let Some(stable) = releases.iter().find(|r| !r.is_prerelease && qualifies(r)) {
        return Some(ReleaseChoice::Stable(stable.clone()));
    }
    releases
        .iter()
        .find(|r| qualifies(r))
        .cloned()
        .map(ReleaseChoice::PrereleaseFallback)
}

/// Builds the update candidate for one application, or None when it is
/// already up to date.
pub fn decide(
    app: &ResolvedApp,
    choice: &ReleaseChoice,
    asset: &Asset,
) -> Option<UpdateCandidate> {
    let release = choice.release();
    let latest = extract_version(&release.tag, app.version_pattern.as_ref())
        .unwrap_or_else(|| release.tag.clone());
    let current = current_version(app);
    let newer = is_newer(
        current.as_deref(),
        &latest,
        newest_local_mtime(app),
        asset.created_at.or(release.published_at),
    );
    if !newer {
        return None;
    }
    let reason = match (&current, choice) {
        (None, _) => "no installed version found".to_string(),
        (Some(installed), ReleaseChoice::Stable(_)) => {
            format!("{installed} -> {latest}")
        }
        (Some(installed), ReleaseChoice::PrereleaseFallback(_)) => {
            format!("{installed} -> {latest} (upstream publishes only prereleases)")
        }
    };
    Some(UpdateCandidate {
        app_name: app.name.clone(),
        current_version: current,
        latest_version: latest,
        asset: asset.clone(),
        checksum_asset: asset.checksum.clone(),
        is_newer: true,
        reason,
    })
}
