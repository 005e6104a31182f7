//! Direct-URL source: the configured URL is the one downloadable artifact.
//!
//! There is no release list to consult, so a synthetic release is built
//! around the URL itself. The version comes from the URL when a version
//! pattern matches it, then from the server's `Last-Modified` or `ETag`
//! header, and as a last resort from a timestamp stamped at check time.

use crate::libs::config::ResolvedApp;
use crate::libs::error::UpdateError;
use crate::libs::release::{Asset, Release};
use crate::libs::http::HttpFacility;
use crate::libs::version;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

/// File extensions that make a URL look like a single downloadable file.
const FILE_EXTENSIONS: &[&str] = &[
    ".appimage", ".zip", ".tar.gz", ".tar.xz", ".tgz", ".deb", ".rpm",
];

/// Client for one directly-downloadable URL.
pub struct DirectClient {
    http: Arc<HttpFacility>,
    url: String,
}

impl DirectClient {
    pub fn new(http: Arc<HttpFacility>, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }

    /// True when the URL path ends in a downloadable file extension.
    pub fn detect_url(url: &Url) -> bool {
        let path = url.path().to_lowercase();
        FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    /// Builds the single synthetic release for the configured URL.
    pub async fn get_releases(&self, app: &ResolvedApp) -> Result<Vec<Release>, UpdateError> {
        let name = filename_from_url(&self.url)
            .ok_or_else(|| UpdateError::Config(format!("'{}' has no filename", self.url)))?;

        let mut asset = Asset::new(name, self.url.clone());
        let mut last_modified = None;
        let mut etag = None;
        if let Ok(head) = self.http.probe(&self.url).await {
            asset.size = head
                .headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            last_modified = head
                .headers()
                .get("last-modified")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                .map(|dt| dt.with_timezone(&Utc));
            etag = head
                .headers()
                .get("etag")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start_matches("W/").trim_matches('"').to_string())
                .filter(|v| !v.is_empty());
        }
        asset.created_at = last_modified;

        let tag = version::extract_version(&self.url, app.version_pattern.as_ref())
            .or_else(|| last_modified.map(|dt| dt.format("%Y%m%d%H%M%S").to_string()))
            .or(etag)
            .unwrap_or_else(|| format!("direct-{}", Utc::now().format("%Y%m%d%H%M%S")));

        Ok(vec![Release {
            tag,
            published_at: last_modified,
            is_prerelease: false,
            assets: vec![asset],
        }])
    }
}

/// Last path segment of a URL, query string stripped.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}
