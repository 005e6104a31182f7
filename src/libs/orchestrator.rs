//! Orchestrates the pipeline across applications.
//!
//! For each enabled application matching the filter: build a repository
//! client, resolve the release to track, select an asset, compare against
//! the installed version, and hand qualifying candidates to the download
//! engine. Applications run concurrently up to the configured ceiling, and
//! a failure in one never kills the batch; every outcome is captured as a
//! typed result labeled by application name.

use crate::api::Repository;
use crate::libs::config::{ConfigSnapshot, ResolvedApp};
use crate::libs::data_storage::DataStorage;
use crate::libs::download::{DownloadEngine, NoProgress, ProgressReporter};
use crate::libs::error::UpdateError;
use crate::libs::host::Host;
use crate::libs::http::HttpFacility;
use crate::libs::outcome::{CheckResult, CheckStatus, DownloadResult, UpdateCandidate};
use crate::libs::selector::{select_asset, InteractiveSelector, PickFirst};
use crate::libs::version::{self, ReleaseChoice};
use futures::stream::StreamExt;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything one run produced, labeled by application.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub checks: Vec<CheckResult>,
    pub downloads: Vec<DownloadResult>,
}

impl RunOutcome {
    /// Worst exit code across the batch: filesystem failures dominate
    /// network failures, which dominate general errors.
    pub fn exit_code(&self) -> i32 {
        let mut code = 0;
        for error in self
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Error)
            .filter_map(|c| c.error.as_deref())
            .chain(self.downloads.iter().filter_map(|d| d.error.as_deref()))
        {
            let kind = classify_error_message(error);
            code = code.max(kind);
        }
        code
    }

    pub fn updates_available(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::UpdateAvailable)
            .count()
    }
}

/// Coarse re-classification of an error message for exit-code purposes.
///
/// Results carry rendered messages rather than live error values, so the
/// mapping keys off the stable message prefixes of [`UpdateError`].
fn classify_error_message(message: &str) -> i32 {
    if message.starts_with("Filesystem error")
        || message.starts_with("Rotation failed")
    {
        crate::libs::error::EXIT_FILESYSTEM
    } else if message.starts_with("Invalid configuration")
        || message.starts_with("Operation cancelled")
        || message.starts_with("No release asset")
    {
        crate::libs::error::EXIT_FAILURE
    } else {
        crate::libs::error::EXIT_NETWORK
    }
}

/// Handle for cancelling a run in flight.
#[derive(Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

/// Drives check and update runs over a config snapshot.
pub struct Orchestrator {
    snapshot: ConfigSnapshot,
    storage: DataStorage,
    http: Arc<HttpFacility>,
    host: Host,
    selector: Arc<dyn InteractiveSelector>,
    progress: Arc<dyn ProgressReporter>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl Orchestrator {
    /// Builds an orchestrator with batch defaults (pick-first ties, no
    /// progress display).
    pub fn new(snapshot: ConfigSnapshot, storage: DataStorage) -> Result<Self, UpdateError> {
        let http = Arc::new(HttpFacility::new(&snapshot.global)?);
        Self::with_parts(snapshot, storage, http, Arc::new(PickFirst), Arc::new(NoProgress))
    }

    /// Full-control constructor for the CLI layer and tests.
    pub fn with_parts(
        snapshot: ConfigSnapshot,
        storage: DataStorage,
        http: Arc<HttpFacility>,
        selector: Arc<dyn InteractiveSelector>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<Self, UpdateError> {
        let host = *Host::snapshot()?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Ok(Self {
            snapshot,
            storage,
            http,
            host,
            selector,
            progress,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        })
    }

    /// Handle that cancels the current run when invoked.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            sender: self.cancel_tx.clone(),
        }
    }

    /// Runs the pipeline for every enabled application matching the filter.
    ///
    /// With `dry_run` the pipeline short-circuits after the version
    /// decision and nothing is downloaded.
    pub async fn run(&self, filter: &[String], dry_run: bool) -> Result<RunOutcome, UpdateError> {
        let apps = self.select_apps(filter)?;
        let engine = Arc::new(DownloadEngine::new(
            self.http.clone(),
            self.snapshot.global.concurrent_downloads,
            self.cancel_rx.clone(),
            self.progress.clone(),
        ));

        let mut outcome = RunOutcome::default();
        let concurrency = self.snapshot.global.concurrent_downloads.max(1) as usize;
        let mut work = futures::stream::iter(apps.into_iter().map(|app| {
            let engine = engine.clone();
            async move { self.run_app(app, dry_run, engine).await }
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<(CheckResult, Option<DownloadResult>)>>()
        .await;

        work.sort_by(|a, b| a.0.app_name.cmp(&b.0.app_name));
        for (check, download) in work {
            outcome.checks.push(check);
            if let Some(download) = download {
                outcome.downloads.push(download);
            }
        }
        Ok(outcome)
    }

    /// Resolves the applications a run will touch.
    fn select_apps(&self, filter: &[String]) -> Result<Vec<ResolvedApp>, UpdateError> {
        let matchers: Vec<Regex> = filter
            .iter()
            .map(|pattern| glob_to_regex(pattern))
            .collect::<Result<_, _>>()?;
        let mut selected = Vec::new();
        for app in &self.snapshot.apps {
            if !matchers.is_empty() && !matchers.iter().any(|m| m.is_match(&app.name)) {
                continue;
            }
            selected.push(self.snapshot.resolve(app)?);
        }
        Ok(selected)
    }

    async fn run_app(
        &self,
        app: ResolvedApp,
        dry_run: bool,
        engine: Arc<DownloadEngine>,
    ) -> (CheckResult, Option<DownloadResult>) {
        if !app.enabled {
            return (CheckResult::disabled(&app.name), None);
        }
        if *self.cancel_rx.borrow() {
            return (CheckResult::cancelled(&app.name), None);
        }
        let (check, candidate) = match self.check_app(&app).await {
            Ok(result) => result,
            Err(UpdateError::Cancelled) => return (CheckResult::cancelled(&app.name), None),
            Err(err) => return (CheckResult::error(&app.name, err.to_string()), None),
        };
        let Some(candidate) = candidate else {
            return (check, None);
        };
        if dry_run {
            return (check, None);
        }
        if *self.cancel_rx.borrow() {
            return (CheckResult::cancelled(&app.name), None);
        }
        let download = engine.download(&app, &candidate).await;
        (check, Some(download))
    }

    /// Resolve, select, and decide for one application.
    async fn check_app(
        &self,
        app: &ResolvedApp,
    ) -> Result<(CheckResult, Option<UpdateCandidate>), UpdateError> {
        let repository =
            Repository::for_app(&self.http, app, &self.snapshot.global, &self.storage).await?;
        let choice = repository.latest_release(app).await?;
        if matches!(choice, ReleaseChoice::PrereleaseFallback(_)) {
            tracing::info!(app = %app.name, "upstream publishes only prereleases");
        }
        let asset = select_asset(
            choice.release(),
            &app.pattern,
            &self.host,
            self.selector.as_ref(),
        )?;

        match version::decide(app, &choice, &asset) {
            Some(candidate) => {
                let check = CheckResult {
                    app_name: app.name.clone(),
                    current_version: candidate.current_version.clone(),
                    latest_version: Some(candidate.latest_version.clone()),
                    status: CheckStatus::UpdateAvailable,
                    error: None,
                };
                Ok((check, Some(candidate)))
            }
            None => {
                let latest = version::extract_version(
                    &choice.release().tag,
                    app.version_pattern.as_ref(),
                )
                .unwrap_or_else(|| choice.release().tag.clone());
                let check = CheckResult {
                    app_name: app.name.clone(),
                    current_version: version::current_version(app),
                    latest_version: Some(latest),
                    status: CheckStatus::UpToDate,
                    error: None,
                };
                Ok((check, None))
            }
        }
    }
}

/// Translates a name filter (`*` and `?` wildcards) into an anchored
/// case-insensitive regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, UpdateError> {
    let mut translated = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            c => translated.push_str(&regex::escape(&c.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated)
        .map_err(|err| UpdateError::Config(format!("invalid filter '{pattern}': {err}")))
}
