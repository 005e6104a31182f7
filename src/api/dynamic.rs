//! Dynamic-page source: a download page scraped on every check.
//!
//! The configured page is fetched as HTML and every anchor pointing at an
//! `.AppImage` file becomes a candidate asset. Versions are extracted from
//! the link filenames when possible, with a scan of the page text as the
//! fallback.

use crate::libs::config::ResolvedApp;
use crate::libs::error::UpdateError;
use crate::libs::http::{HttpFacility, Purpose};
use crate::libs::release::{Asset, Release};
use crate::libs::version;
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use url::Url;

fn appimage_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)href=["']([^"']+\.AppImage)["']"#).unwrap())
}

fn page_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Vv]ersion\s*:?\s*v?(\d+\.\d+(?:\.\d+)?)").unwrap())
}

/// Scraping client for one dynamic download page.
pub struct DynamicClient {
    http: Arc<HttpFacility>,
    url: String,
}

impl DynamicClient {
    pub fn new(http: Arc<HttpFacility>, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }

    /// Scrapes the page into one synthetic release.
    pub async fn get_releases(&self, app: &ResolvedApp) -> Result<Vec<Release>, UpdateError> {
        let response = self.http.fetch(&self.url, Purpose::Scrape).await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(UpdateError::NotFound(self.url.clone()));
        }
        if !status.is_success() {
            return Err(UpdateError::UpstreamUnavailable(format!(
                "{}: HTTP {status}",
                self.url
            )));
        }
        // Redirects are followed; resolve relative links against where we
        // actually landed.
        let base = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|err| UpdateError::Transport(err.to_string()))?;

        let links = extract_appimage_links(&html, &base);
        if links.is_empty() {
            return Err(UpdateError::UnparseableSource(format!(
                "no AppImage links found at {}",
                self.url
            )));
        }

        let assets: Vec<Asset> = links
            .into_iter()
            .filter_map(|link| {
                let name = link.path_segments()?.filter(|s| !s.is_empty()).next_back()?.to_string();
                Some(Asset::new(name, link.to_string()))
            })
            .collect();
        if assets.is_empty() {
            return Err(UpdateError::UnparseableSource(format!(
                "no usable AppImage links found at {}",
                self.url
            )));
        }

        let tag = assets
            .iter()
            .find_map(|asset| {
                version::extract_version(&asset.name, app.version_pattern.as_ref())
            })
            .or_else(|| {
                page_version()
                    .captures(&html)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let mut release = Release {
            tag,
            published_at: None,
            is_prerelease: false,
            assets,
        };
        release.attach_checksums(&app.checksum.pattern);
        Ok(vec![release])
    }
}

/// Extracts absolute AppImage link targets from page HTML, deduplicated in
/// page order.
pub fn extract_appimage_links(html: &str, base: &Url) -> Vec<Url> {
    let mut seen = std::collections::HashSet::new();
    appimage_link()
        .captures_iter(html)
        .filter_map(|captures| captures.get(1))
        .filter_map(|m| base.join(m.as_str()).ok())
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}
