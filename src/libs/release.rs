//! Release and asset models.
//!
//! Thin value types produced by the repository clients and consumed by the
//! selector and download engine. Assets derive their architecture, platform,
//! and file-extension tokens by scanning the filename against the host
//! vocabulary.

use crate::libs::host::{Architecture, PLATFORM_TOKENS};
use chrono::{DateTime, Utc};
use regex::Regex;

/// A small file whose contents are the cryptographic hash of another asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecksumAsset {
    pub name: String,
    pub url: String,
}

/// One downloadable file belonging to a release.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Filename as published upstream.
    pub name: String,
    /// Download target.
    pub url: String,
    /// Size in bytes; None until a HEAD request resolves it for scraped
    /// sources.
    pub size: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    /// Associated checksum file, when one was published alongside.
    pub checksum: Option<ChecksumAsset>,
}

impl Asset {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Asset {
        Asset {
            name: name.into(),
            url: url.into(),
            size: None,
            created_at: None,
            checksum: None,
        }
    }

    /// Architecture token found in the filename, lowercased, or None when
    /// the name carries no architecture marker.
    pub fn architecture_token(&self) -> Option<String> {
        let lower = self.name.to_lowercase();
        Architecture::all_tokens()
            .iter()
            .find(|token| contains_token(&lower, token))
            .map(|token| token.to_string())
    }

    /// Normalized platform ("linux", "darwin", "windows") named in the
    /// filename, or None for generic assets.
    pub fn platform_token(&self) -> Option<&'static str> {
        let lower = self.name.to_lowercase();
        PLATFORM_TOKENS
            .iter()
            .find(|(token, _)| contains_token(&lower, token))
            .map(|(_, normalized)| *normalized)
    }

    /// File extension, honoring compound archive extensions (`tar.gz`).
    pub fn file_extension(&self) -> String {
        let lower = self.name.to_lowercase();
        for compound in ["tar.gz", "tar.xz", "tar.bz2"] {
            if lower.ends_with(&format!(".{compound}")) {
                return compound.to_string();
            }
        }
        lower.rsplit('.').next().unwrap_or_default().to_string()
    }

    /// True when this asset is an AppImage (rotation suffixes included).
    pub fn is_appimage(&self) -> bool {
        let lower = self.name.to_lowercase();
        lower.ends_with(".appimage") || lower.contains(".appimage.")
    }

    pub fn is_zip(&self) -> bool {
        self.file_extension() == "zip"
    }
}

/// A versioned upstream publication grouping assets under a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
    pub is_prerelease: bool,
    pub assets: Vec<Asset>,
}

impl Release {
    /// Assets whose filenames match the application pattern.
    pub fn matching_assets(&self, pattern: &Regex) -> Vec<&Asset> {
        self.assets
            .iter()
            .filter(|asset| pattern.is_match(&asset.name))
            .collect()
    }

    /// Associates checksum files with the assets they describe.
    ///
    /// The pattern is a template containing `{filename}`; for each asset the
    /// substituted name is looked up among the release's other assets. The
    /// match is case-insensitive since forges preserve arbitrary casing.
    pub fn attach_checksums(&mut self, checksum_pattern: &str) {
        let lookup: Vec<(String, String, String)> = self
            .assets
            .iter()
            .map(|a| (a.name.to_lowercase(), a.name.clone(), a.url.clone()))
            .collect();
        for asset in &mut self.assets {
            let wanted = checksum_pattern
                .replace("{filename}", &asset.name)
                .to_lowercase();
            if wanted == asset.name.to_lowercase() {
                continue;
            }
            if let Some((_, name, url)) = lookup.iter().find(|(lower, _, _)| *lower == wanted) {
                asset.checksum = Some(ChecksumAsset {
                    name: name.clone(),
                    url: url.clone(),
                });
            }
        }
    }
}

/// Token match bounded by word edges, so `x86` does not fire inside
/// `x86_64` and `x64` does not fire inside `win64`.
fn contains_token(haystack: &str, token: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(token) {
        let begin = start + pos;
        let end = begin + token.len();
        let left_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let right_ok =
            end == haystack.len() || !(bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_');
        if left_ok && right_ok {
            return true;
        }
        start = begin + 1;
    }
    false
}
