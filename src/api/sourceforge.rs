//! SourceForge file-listing scraper.
//!
//! SourceForge exposes no release API worth the name, so the project's
//! files page is scraped for `.AppImage` anchors. Each anchor gets a HEAD
//! request to resolve size and modification time, and everything is folded
//! into one synthetic release whose tag is extracted from the newest
//! filename.

use crate::libs::config::ResolvedApp;
use crate::libs::error::UpdateError;
use crate::libs::http::{HttpFacility, Purpose};
use crate::libs::release::{Asset, Release};
use crate::libs::version;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use url::Url;

fn appimage_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)href="(/projects/[^"]+/files/[^"]+\.AppImage)(?:/download)?""#).unwrap()
    })
}

/// Scraping client for one SourceForge project.
pub struct SourceForgeClient {
    http: Arc<HttpFacility>,
    project: String,
}

impl SourceForgeClient {
    pub fn from_url(http: Arc<HttpFacility>, url: &str) -> Result<Self, UpdateError> {
        let parsed = Url::parse(url)
            .map_err(|err| UpdateError::Config(format!("invalid url '{url}': {err}")))?;
        let project = parsed
            .path_segments()
            .and_then(|mut segments| {
                // Paths look like /projects/<name>/... or /p/<name>/...
                match segments.next() {
                    Some("projects") | Some("p") => segments.next().map(str::to_string),
                    _ => None,
                }
            })
            .ok_or_else(|| {
                UpdateError::Config(format!("'{url}' is not a sourceforge project url"))
            })?;
        Ok(Self { http, project })
    }

    /// True for URLs under sourceforge.net.
    pub fn detect_url(url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host == "sourceforge.net" || host.ends_with(".sourceforge.net"))
    }

    /// Scrapes the file listing into one synthetic release.
    pub async fn get_releases(&self, app: &ResolvedApp) -> Result<Vec<Release>, UpdateError> {
        let listing_url = format!("https://sourceforge.net/projects/{}/files/", self.project);
        let response = self.http.fetch(&listing_url, Purpose::Scrape).await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(UpdateError::NotFound(format!(
                "sourceforge project {}",
                self.project
            )));
        }
        if !status.is_success() {
            return Err(UpdateError::UpstreamUnavailable(format!(
                "{listing_url}: HTTP {status}"
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|err| UpdateError::Transport(err.to_string()))?;

        let paths = extract_appimage_paths(&html);
        if paths.is_empty() {
            return Err(UpdateError::UnparseableSource(format!(
                "no AppImage files listed at {listing_url}"
            )));
        }

        let mut assets = Vec::new();
        let mut newest: Option<(DateTime<Utc>, String)> = None;
        for path in paths {
            let name = match path.rsplit('/').next() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            let download_url = format!("https://sourceforge.net{path}/download");
            let mut asset = Asset::new(name.clone(), download_url.clone());
            // HEAD resolves what the listing page does not tell us.
            if let Ok(head) = self.http.probe(&download_url).await {
                asset.size = head
                    .headers()
                    .get("content-length")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                asset.created_at = head
                    .headers()
                    .get("last-modified")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                    .map(|dt| dt.with_timezone(&Utc));
            }
            if let Some(created) = asset.created_at {
                if newest.as_ref().map(|(when, _)| created > *when).unwrap_or(true) {
                    newest = Some((created, name.clone()));
                }
            }
            assets.push(asset);
        }

        let tag_source = newest
            .map(|(_, name)| name)
            .or_else(|| assets.first().map(|a| a.name.clone()))
            .unwrap_or_default();
        let tag = version::extract_version(&tag_source, app.version_pattern.as_ref())
            .unwrap_or_else(|| tag_source.clone());
        let published_at = assets.iter().filter_map(|a| a.created_at).max();

        let mut release = Release {
            tag,
            published_at,
            is_prerelease: false,
            assets,
        };
        release.attach_checksums(&app.checksum.pattern);
        Ok(vec![release])
    }
}

/// Pulls AppImage file paths out of the listing HTML, deduplicated in
/// page order.
pub fn extract_appimage_paths(html: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    appimage_anchor()
        .captures_iter(html)
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
