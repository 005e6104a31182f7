//! GitLab-like forge API client.
//!
//! Talks to the `/api/v4/` releases surface of gitlab.com or a self-hosted
//! instance. Release assets come from the release's `assets.links` list;
//! GitLab does not publish sizes there, so they stay unset until the
//! download engine observes the body.

use crate::api::RELEASES_PER_PAGE;
use crate::libs::config::ResolvedApp;
use crate::libs::error::UpdateError;
use crate::libs::http::{HttpFacility, Purpose};
use crate::libs::release::{Asset, Release};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    released_at: Option<DateTime<Utc>>,
    #[serde(default)]
    upcoming_release: bool,
    #[serde(default)]
    assets: ApiAssets,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAssets {
    #[serde(default)]
    links: Vec<ApiLink>,
}

#[derive(Debug, Deserialize)]
struct ApiLink {
    name: String,
    url: String,
    direct_asset_url: Option<String>,
}

/// Client for one GitLab-like project.
pub struct GitLabClient {
    http: Arc<HttpFacility>,
    api_base: String,
    /// URL-encoded `owner/project` path.
    project: String,
    token: Option<String>,
}

impl GitLabClient {
    pub fn from_url(
        http: Arc<HttpFacility>,
        url: &str,
        token: Option<String>,
    ) -> Result<Self, UpdateError> {
        let parsed = Url::parse(url)
            .map_err(|err| UpdateError::Config(format!("invalid url '{url}': {err}")))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() < 2 {
            return Err(UpdateError::Config(format!(
                "'{url}' has no project path"
            )));
        }
        let project = segments
            .iter()
            .map(|s| s.trim_end_matches(".git"))
            .collect::<Vec<_>>()
            .join("%2F");
        let scheme = parsed.scheme();
        let host = parsed.host_str().unwrap_or("gitlab.com");
        let api_base = match parsed.port() {
            Some(port) => format!("{scheme}://{host}:{port}/api/v4"),
            None => format!("{scheme}://{host}/api/v4"),
        };
        Ok(Self {
            http,
            api_base,
            project,
            token,
        })
    }

    /// True for URLs on gitlab.com.
    pub fn detect_url(url: &Url) -> bool {
        matches!(url.host_str(), Some("gitlab.com") | Some("www.gitlab.com"))
    }

    /// Probes an unknown origin for a GitLab-compatible `/api/v4/` surface.
    pub async fn probe(http: &Arc<HttpFacility>, url: &Url) -> bool {
        let scheme = url.scheme();
        let host = match url.host_str() {
            Some(host) => host,
            None => return false,
        };
        let probe_url = match url.port() {
            Some(port) => format!("{scheme}://{host}:{port}/api/v4/version"),
            None => format!("{scheme}://{host}/api/v4/version"),
        };
        match http.fetch(&probe_url, Purpose::Probe).await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.as_u16() == 401 || status.as_u16() == 403
            }
            Err(_) => false,
        }
    }

    pub async fn get_releases(
        &self,
        app: &ResolvedApp,
        limit: usize,
    ) -> Result<Vec<Release>, UpdateError> {
        let mut releases = Vec::new();
        let mut page = 1;
        while releases.len() < limit {
            let per_page = RELEASES_PER_PAGE.min(limit - releases.len());
            let url = format!(
                "{}/projects/{}/releases?per_page={}&page={}",
                self.api_base, self.project, per_page, page
            );
            let mut request = self.http.get(&url);
            if let Some(token) = &self.token {
                request = request.header("PRIVATE-TOKEN", token.clone());
            }
            let response = self.http.execute(request, Purpose::Api).await?;
            let status = response.status();
            if status.as_u16() == 404 {
                return Err(UpdateError::NotFound(format!(
                    "project {} on {}",
                    self.project, self.api_base
                )));
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(UpdateError::Auth(format!(
                    "{} rejected the request with {status}",
                    self.api_base
                )));
            }
            if status.as_u16() == 429 {
                return Err(UpdateError::RateLimited);
            }
            if !status.is_success() {
                return Err(UpdateError::UpstreamUnavailable(format!(
                    "{url}: HTTP {status}"
                )));
            }
            let batch: Vec<ApiRelease> = response
                .json()
                .await
                .map_err(|err| UpdateError::UnparseableSource(err.to_string()))?;
            let received = batch.len();
            for api_release in batch {
                let mut release = Release {
                    tag: api_release.tag_name,
                    published_at: api_release.released_at,
                    is_prerelease: api_release.upcoming_release,
                    assets: api_release
                        .assets
                        .links
                        .into_iter()
                        .map(|link| Asset {
                            name: link.name,
                            url: link.direct_asset_url.unwrap_or(link.url),
                            size: None,
                            created_at: None,
                            checksum: None,
                        })
                        .collect(),
                };
                release.attach_checksums(&app.checksum.pattern);
                releases.push(release);
            }
            if received < per_page {
                break;
            }
            page += 1;
        }
        Ok(releases)
    }
}
