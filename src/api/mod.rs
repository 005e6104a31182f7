//! Repository clients for the supported upstream source variants.
//!
//! The five variants form a closed sum type: forge APIs (GitHub-like and
//! GitLab-like), the SourceForge file-listing scraper, direct single-file
//! URLs, and scraped dynamic download pages. [`Repository::for_app`] is the
//! factory: an explicit `source_type` is honored without probing, known
//! hosts map directly, and unknown hosts are probed for a forge-compatible
//! API before falling back to page scraping.

pub mod direct;
pub mod dynamic;
pub mod github;
pub mod gitlab;
pub mod sourceforge;

use crate::libs::config::{GlobalConfig, ResolvedApp, SourceType};
use crate::libs::data_storage::DataStorage;
use crate::libs::error::UpdateError;
use crate::libs::http::HttpFacility;
use crate::libs::release::Release;
use crate::libs::version::{choose_release, ReleaseChoice};
use std::env;
use std::fs;
use std::sync::Arc;
use url::Url;

/// Ceiling for progressive fetching: how many releases a forge client will
/// walk looking for the first qualifying stable release.
pub const PROGRESSIVE_FETCH_CEILING: usize = 1600;

/// Page size for forge release listings.
pub const RELEASES_PER_PAGE: usize = 100;

/// A configured upstream source, one of the five supported variants.
pub enum Repository {
    GitHub(github::GitHubClient),
    GitLab(gitlab::GitLabClient),
    SourceForge(sourceforge::SourceForgeClient),
    Direct(direct::DirectClient),
    Dynamic(dynamic::DynamicClient),
}

impl Repository {
    /// Builds the client for an application.
    ///
    /// An explicit `source_type` (or the `direct` flag) skips detection.
    /// Otherwise the URL host decides where possible, then the origin is
    /// probed for `/api/v3/` (GitHub-like) and `/api/v4/` (GitLab-like)
    /// APIs, and finally file-looking URLs become direct sources while
    /// everything else is scraped dynamically.
    pub async fn for_app(
        http: &Arc<HttpFacility>,
        app: &ResolvedApp,
        global: &GlobalConfig,
        storage: &DataStorage,
    ) -> Result<Repository, UpdateError> {
        if let Some(source_type) = app.source_type {
            return Self::from_type(source_type, http, app, global, storage);
        }
        if app.direct {
            return Self::from_type(SourceType::Direct, http, app, global, storage);
        }

        let url = Url::parse(&app.url)
            .map_err(|err| UpdateError::Config(format!("{}: invalid url: {err}", app.name)))?;
        if github::GitHubClient::detect_url(&url) {
            return Self::from_type(SourceType::GithubApi, http, app, global, storage);
        }
        if gitlab::GitLabClient::detect_url(&url) {
            return Self::from_type(SourceType::GitlabApi, http, app, global, storage);
        }
        if sourceforge::SourceForgeClient::detect_url(&url) {
            return Self::from_type(SourceType::SourceForge, http, app, global, storage);
        }
        if github::GitHubClient::probe(http, &url).await {
            return Self::from_type(SourceType::GithubApi, http, app, global, storage);
        }
        if gitlab::GitLabClient::probe(http, &url).await {
            return Self::from_type(SourceType::GitlabApi, http, app, global, storage);
        }
        if direct::DirectClient::detect_url(&url) {
            return Self::from_type(SourceType::Direct, http, app, global, storage);
        }
        Self::from_type(SourceType::Dynamic, http, app, global, storage)
    }

    fn from_type(
        source_type: SourceType,
        http: &Arc<HttpFacility>,
        app: &ResolvedApp,
        global: &GlobalConfig,
        storage: &DataStorage,
    ) -> Result<Repository, UpdateError> {
        match source_type {
            SourceType::GithubApi => {
                let token = resolve_auth_token(source_type, &app.name, storage, global);
                Ok(Repository::GitHub(github::GitHubClient::from_url(
                    http.clone(),
                    &app.url,
                    token,
                )?))
            }
            SourceType::GitlabApi => {
                let token = resolve_auth_token(source_type, &app.name, storage, global);
                Ok(Repository::GitLab(gitlab::GitLabClient::from_url(
                    http.clone(),
                    &app.url,
                    token,
                )?))
            }
            SourceType::SourceForge => Ok(Repository::SourceForge(
                sourceforge::SourceForgeClient::from_url(http.clone(), &app.url)?,
            )),
            SourceType::Direct => Ok(Repository::Direct(direct::DirectClient::new(
                http.clone(),
                &app.url,
            ))),
            SourceType::Dynamic => Ok(Repository::Dynamic(dynamic::DynamicClient::new(
                http.clone(),
                &app.url,
            ))),
        }
    }

    /// The variant this client implements.
    pub fn source_type(&self) -> SourceType {
        match self {
            Repository::GitHub(_) => SourceType::GithubApi,
            Repository::GitLab(_) => SourceType::GitlabApi,
            Repository::SourceForge(_) => SourceType::SourceForge,
            Repository::Direct(_) => SourceType::Direct,
            Repository::Dynamic(_) => SourceType::Dynamic,
        }
    }

    /// Canonical form of a source URL for this variant.
    ///
    /// Forge URLs are reduced to their owner/repository root (users often
    /// paste release or tag pages); other variants keep the URL as given,
    /// trailing slash trimmed.
    pub fn normalize_url(&self, url: &str) -> String {
        let trimmed = url.trim_end_matches('/').to_string();
        let Ok(parsed) = Url::parse(url) else {
            return trimmed;
        };
        match self {
            Repository::GitHub(_) => {
                github::GitHubClient::normalize_url(&parsed).unwrap_or(trimmed)
            }
            _ => trimmed,
        }
    }

    /// Whether this variant recognizes the URL as its own.
    pub fn detect_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        match self {
            Repository::GitHub(_) => github::GitHubClient::detect_url(&parsed),
            Repository::GitLab(_) => gitlab::GitLabClient::detect_url(&parsed),
            Repository::SourceForge(_) => sourceforge::SourceForgeClient::detect_url(&parsed),
            Repository::Direct(_) => direct::DirectClient::detect_url(&parsed),
            Repository::Dynamic(_) => true,
        }
    }

    /// Fetches up to `limit` recent releases, newest first.
    pub async fn get_releases(
        &self,
        app: &ResolvedApp,
        limit: usize,
    ) -> Result<Vec<Release>, UpdateError> {
        match self {
            Repository::GitHub(client) => client.get_releases(app, limit).await,
            Repository::GitLab(client) => client.get_releases(app, limit).await,
            Repository::SourceForge(client) => client.get_releases(app).await,
            Repository::Direct(client) => client.get_releases(app).await,
            Repository::Dynamic(client) => client.get_releases(app).await,
        }
    }

    /// Resolves the release to track, walking forge history progressively.
    ///
    /// Forge sources fetch page by page until a qualifying stable release
    /// appears or the ceiling is hit; projects that publish long runs of
    /// continuous prereleases between stable tags are handled this way.
    /// Synthetic single-release sources decide in one step.
    pub async fn latest_release(&self, app: &ResolvedApp) -> Result<ReleaseChoice, UpdateError> {
        let paginated = matches!(self, Repository::GitHub(_) | Repository::GitLab(_));
        let mut limit = RELEASES_PER_PAGE;
        loop {
            let releases = self.get_releases(app, limit).await?;
            if let Some(choice @ ReleaseChoice::Stable(_)) = choose_release(&releases, app) {
                return Ok(choice);
            }
            let exhausted = !paginated || releases.len() < limit || limit >= PROGRESSIVE_FETCH_CEILING;
            if exhausted {
                if releases.is_empty() {
                    return Err(UpdateError::NotFound(format!(
                        "no releases found for {}",
                        app.name
                    )));
                }
                return choose_release(&releases, app).ok_or_else(|| {
                    UpdateError::NoMatchingAsset {
                        pattern: app.pattern.as_str().to_string(),
                    }
                });
            }
            limit = (limit * 2).min(PROGRESSIVE_FETCH_CEILING);
        }
    }
}

/// Resolves the bearer token for a forge source.
///
/// Order: the forge's well-known environment variable, the application-
/// scoped override, the token sidecar file in the configuration directory,
/// and finally a token embedded in the global config. Anonymous requests
/// proceed when nothing is found.
pub fn resolve_auth_token(
    source_type: SourceType,
    app_name: &str,
    storage: &DataStorage,
    global: &GlobalConfig,
) -> Option<String> {
    let (platform_var, token_file) = match source_type {
        SourceType::GithubApi => ("GITHUB_TOKEN", ".github_token"),
        SourceType::GitlabApi => ("GITLAB_TOKEN", ".gitlab_token"),
        _ => return None,
    };
    let non_empty = |s: String| {
        let trimmed = s.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };
    let scoped_var = format!(
        "APPIMAGE_UPDATER_{}_TOKEN",
        app_name.to_uppercase().replace(['-', '.'], "_")
    );
    env::var(platform_var)
        .ok()
        .and_then(non_empty)
        .or_else(|| env::var(&scoped_var).ok().and_then(non_empty))
        .or_else(|| {
            fs::read_to_string(storage.base().join(token_file))
                .ok()
                .and_then(non_empty)
        })
        .or_else(|| global.auth_token.clone().and_then(non_empty))
}
