//! GitHub-like forge API client.
//!
//! Speaks the GitHub releases REST surface, both on github.com and on
//! self-hosted forges exposing the compatible `/api/v3/` prefix. Listings
//! are paginated; assets carry sizes and creation instants straight from
//! the API, and checksum files published alongside are associated with the
//! assets they describe.

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
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: Vec<ApiAsset>,
}

#[derive(Debug, Deserialize)]
struct ApiAsset {
    name: String,
    browser_download_url: String,
    size: Option<u64>,
    created_at: Option<DateTime<Utc>>,
}

/// Client for one GitHub-like repository.
pub struct GitHubClient {
    http: Arc<HttpFacility>,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Parses a repository URL into owner/repo and the API base.
    ///
    /// `https://github.com/FreeCAD/FreeCAD` talks to `api.github.com`;
    /// any other host is treated as a self-hosted forge with the API at
    /// `<origin>/api/v3`.
    pub fn from_url(
        http: Arc<HttpFacility>,
        url: &str,
        token: Option<String>,
    ) -> Result<Self, UpdateError> {
        let parsed = Url::parse(url)
            .map_err(|err| UpdateError::Config(format!("invalid url '{url}': {err}")))?;
        let (owner, repo) = owner_repo(&parsed)
            .ok_or_else(|| UpdateError::Config(format!("'{url}' has no owner/repository path")))?;
        let api_base = if is_github_host(&parsed) {
            "https://api.github.com".to_string()
        } else {
            format!("{}/api/v3", origin(&parsed))
        };
        Ok(Self {
            http,
            api_base,
            owner,
            repo,
            token,
        })
    }

    /// True for URLs on github.com.
    pub fn detect_url(url: &Url) -> bool {
        is_github_host(url)
    }

    /// Probes an unknown origin for a GitHub-compatible `/api/v3/` surface.
    pub async fn probe(http: &Arc<HttpFacility>, url: &Url) -> bool {
        let probe_url = format!("{}/api/v3/", origin(url));
        match http.fetch(&probe_url, Purpose::Probe).await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.as_u16() == 401 || status.as_u16() == 403
            }
            Err(_) => false,
        }
    }

    /// Canonical repository URL with extra path segments dropped.
    pub fn normalize_url(url: &Url) -> Option<String> {
        let (owner, repo) = owner_repo(url)?;
        Some(format!("{}/{}/{}", origin(url), owner, repo))
    }

    /// Fetches up to `limit` releases, newest first, paginating as needed.
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
                "{}/repos/{}/{}/releases?per_page={}&page={}",
                self.api_base, self.owner, self.repo, per_page, page
            );
            let mut request = self
                .http
                .get(&url)
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
            let response = self.http.execute(request, Purpose::Api).await?;
            let status = response.status();
            if status.as_u16() == 404 {
                return Err(UpdateError::NotFound(format!(
                    "{}/{} on {}",
                    self.owner, self.repo, self.api_base
                )));
            }
            if status.as_u16() == 401 {
                return Err(UpdateError::Auth(format!("{} rejected the token", self.api_base)));
            }
            if status.as_u16() == 403 {
                let exhausted = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v == "0")
                    .unwrap_or(false);
                if exhausted {
                    return Err(UpdateError::RateLimited);
                }
                return Err(UpdateError::Auth(format!("{} returned 403", self.api_base)));
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
                if api_release.draft {
                    continue;
                }
                let mut release = Release {
                    tag: api_release.tag_name,
                    published_at: api_release.published_at,
                    is_prerelease: api_release.prerelease,
                    assets: api_release
                        .assets
                        .into_iter()
                        .map(|asset| Asset {
                            name: asset.name,
                            url: asset.browser_download_url,
                            size: asset.size,
                            created_at: asset.created_at,
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

fn is_github_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("github.com") | Some("www.github.com"))
}

fn origin(url: &Url) -> String {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    }
}

/// First two path segments of a forge repository URL, `.git` stripped.
pub fn owner_repo(url: &Url) -> Option<(String, String)> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner, repo))
}
