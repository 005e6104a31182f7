//! Derives an asset-matching regex from observed release listings.
//!
//! Upstream projects rarely name their artifacts consistently enough for an
//! exact match, so a pattern is generalized from recent release filenames:
//! version numbers, date stamps, and platform suffixes are stripped from the
//! common prefix, and the composed regex always accepts the rotation
//! suffixes so freshly-rotated files keep matching.

use crate::libs::release::Release;
use regex::Regex;
use std::sync::OnceLock;

/// How many recent releases the generator samples by default.
pub const DEFAULT_RELEASE_SAMPLE: usize = 20;

/// Tail accepted after the extension: nothing, `.current`, or `.old<k>`.
const ROTATION_TAIL: &str = r"(\.(|current|old[0-9]*))?$";

fn version_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[_-]v?\d+(\.\d+)*").unwrap())
}

fn date_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[_-]?\d{4}[.\-_]\d{2}[.\-_]\d{2}").unwrap())
}

fn platform_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)[_-](linux|ubuntu|x86_64|amd64|aarch64|arm64|armv7l?|armhf|i686|i386|x64|x86)",
        )
        .unwrap()
    })
}

/// Candidate grouping: stable releases beat prereleases, AppImages beat
/// ZIPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Group {
    StableAppImage,
    StableZip,
    PrereleaseAppImage,
    PrereleaseZip,
}

fn classify(filename: &str, prerelease: bool) -> Option<Group> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".appimage") {
        Some(if prerelease {
            Group::PrereleaseAppImage
        } else {
            Group::StableAppImage
        })
    } else if lower.ends_with(".zip") {
        Some(if prerelease {
            Group::PrereleaseZip
        } else {
            Group::StableZip
        })
    } else {
        None
    }
}

/// Derives a pattern from release listings, preferring the most useful
/// filename group. Returns None when no AppImage or ZIP assets exist.
pub fn pattern_from_releases(releases: &[Release]) -> Option<String> {
    let mut grouped: Vec<(Group, String)> = Vec::new();
    for release in releases.iter().take(DEFAULT_RELEASE_SAMPLE) {
        for asset in &release.assets {
            if let Some(group) = classify(&asset.name, release.is_prerelease) {
                grouped.push((group, asset.name.clone()));
            }
        }
    }
    for group in [
        Group::StableAppImage,
        Group::StableZip,
        Group::PrereleaseAppImage,
        Group::PrereleaseZip,
    ] {
        let names: Vec<&str> = grouped
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|(_, name)| name.as_str())
            .collect();
        if !names.is_empty() {
            return Some(pattern_from_filenames(&names));
        }
    }
    None
}

/// Derives a pattern from a set of filenames belonging to one group.
pub fn pattern_from_filenames(names: &[&str]) -> String {
    let stripped: Vec<String> = names.iter().map(|name| strip_extension(name)).collect();
    let refs: Vec<&str> = stripped.iter().map(|s| s.as_str()).collect();
    let prefix = longest_common_prefix(&refs);
    let generalized = generalize_prefix(&prefix);
    compose(&generalized)
}

/// Fallback when no releases are accessible: derive from the application
/// name itself.
pub fn pattern_from_name(name: &str) -> String {
    compose(&generalize_prefix(name))
}

fn strip_extension(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with(".appimage") {
        name[..name.len() - ".appimage".len()].to_string()
    } else if lower.ends_with(".zip") {
        name[..name.len() - ".zip".len()].to_string()
    } else {
        name.to_string()
    }
}

fn longest_common_prefix(names: &[&str]) -> String {
    let first = match names.first() {
        Some(first) => *first,
        None => return String::new(),
    };
    let mut end = first.len();
    for name in &names[1..] {
        let common = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .count();
        let byte_end = first
            .char_indices()
            .nth(common)
            .map(|(i, _)| i)
            .unwrap_or(first.len());
        end = end.min(byte_end);
    }
    first[..end].to_string()
}

/// Drops the variable parts of a prefix.
///
/// The prefix is cut at the first version-like, date-like, or platform
/// substring; everything behind that point is covered by the `.*` in the
/// composed pattern, so the remaining literal still prefixes every
/// training name.
fn generalize_prefix(prefix: &str) -> String {
    let mut cut = prefix.len();
    for matcher in [date_like(), version_like(), platform_suffix()] {
        if let Some(found) = matcher.find(prefix) {
            cut = cut.min(found.start());
        }
    }
    prefix[..cut]
        .trim_end_matches(['-', '_', '.', ' '])
        .to_string()
}

/// Escapes the prefix and widens `-`/`_` boundaries into a character class,
/// then composes the full pattern with extension and rotation tail.
fn compose(prefix: &str) -> String {
    let mut escaped = String::new();
    for ch in prefix.chars() {
        match ch {
            '-' | '_' => escaped.push_str("[_-]"),
            c => escaped.push_str(&regex::escape(&c.to_string())),
        }
    }
    format!(r"(?i){escaped}.*\.(zip|AppImage){ROTATION_TAIL}")
}
