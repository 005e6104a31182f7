//! Asset selection: compatibility scoring over a release's artifacts.
//!
//! Survivors of the application pattern are scored on three axes
//! (architecture, platform, package format); anything incompatible on
//! architecture or platform is dropped, and the best-scoring AppImage-
//! leaning candidate wins. Ties in an interactive session are delegated to
//! an injected [`InteractiveSelector`]; non-interactive runs pick the first.

use crate::libs::error::UpdateError;
use crate::libs::host::{Architecture, Host};
use crate::libs::release::{Asset, Release};
use regex::Regex;

/// Capability for resolving selection ties with the user.
///
/// The core never talks to a terminal; the CLI layer injects a dialoguer
/// implementation while batch runs and tests use [`PickFirst`].
pub trait InteractiveSelector: Send + Sync {
    /// Picks one asset from equally-ranked candidates, or None to abort.
    fn pick(&self, candidates: &[Asset]) -> Option<Asset>;
}

/// Non-interactive tie-breaker: take the first candidate as sorted.
pub struct PickFirst;

impl InteractiveSelector for PickFirst {
    fn pick(&self, candidates: &[Asset]) -> Option<Asset> {
        candidates.first().cloned()
    }
}

/// An asset together with its compatibility sub-scores.
#[derive(Debug, Clone)]
pub struct ScoredAsset {
    pub asset: Asset,
    pub arch_score: u32,
    pub platform_score: u32,
    pub format_score: u32,
}

impl ScoredAsset {
    pub fn total(&self) -> u32 {
        self.arch_score + self.platform_score + self.format_score
    }
}

/// Architecture sub-score: exact 100, alias of the host architecture 80,
/// some other architecture 0, no architecture marker 50.
pub fn arch_score(asset: &Asset, host: &Host) -> u32 {
    match asset.architecture_token() {
        Some(token) => {
            if token == host.architecture.canonical() {
                100
            } else if Architecture::normalize(&token) == Some(host.architecture) {
                80
            } else {
                0
            }
        }
        None => 50,
    }
}

/// Platform sub-score: linux 100, another platform 0, generic 50.
pub fn platform_score(asset: &Asset) -> u32 {
    match asset.platform_token() {
        Some("linux") => 100,
        Some(_) => 0,
        None => 50,
    }
}

/// Scores every pattern-matching asset in a release.
pub fn score_assets(release: &Release, pattern: &Regex, host: &Host) -> Vec<ScoredAsset> {
    release
        .matching_assets(pattern)
        .into_iter()
        .map(|asset| ScoredAsset {
            asset: asset.clone(),
            arch_score: arch_score(asset, host),
            platform_score: platform_score(asset),
            format_score: host.format_score(&asset.file_extension()),
        })
        .collect()
}

/// Selects one asset from a release, or fails with `NoMatchingAsset`.
pub fn select_asset(
    release: &Release,
    pattern: &Regex,
    host: &Host,
    selector: &dyn InteractiveSelector,
) -> Result<Asset, UpdateError> {
    let mut scored = score_assets(release, pattern, host);
    // Hard incompatibilities are eliminated outright.
    scored.retain(|s| s.arch_score > 0 && s.platform_score > 0);
    if scored.is_empty() {
        return Err(UpdateError::NoMatchingAsset {
            pattern: pattern.as_str().to_string(),
        });
    }
    scored.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| b.asset.is_appimage().cmp(&a.asset.is_appimage()))
            .then_with(|| b.asset.created_at.cmp(&a.asset.created_at))
    });
    let top = scored[0].total();
    let tied: Vec<Asset> = scored
        .iter()
        .take_while(|s| s.total() == top)
        .map(|s| s.asset.clone())
        .collect();
    if tied.len() > 1 {
        return selector
            .pick(&tied)
            .ok_or(UpdateError::Cancelled);
    }
    Ok(scored.remove(0).asset)
}
