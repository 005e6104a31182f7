//! Download engine: fetch, verify, extract, rotate.
//!
//! Each update candidate runs the same per-application pipeline: acquire a
//! concurrency slot, stream the asset to a `.partial` file with retries,
//! verify the published checksum, unwrap ZIP-packaged AppImages, mark the
//! result executable, record the version sidecar, and rotate it into the
//! stable layout. Partial files never survive a failure; a rotation that
//! has begun always runs to completion.

use crate::libs::config::{ChecksumAlgorithm, ResolvedApp};
use crate::libs::error::UpdateError;
use crate::libs::http::{HttpFacility, Purpose};
use crate::libs::messages::Message;
use crate::libs::outcome::{ChecksumOutcome, ChecksumResult, DownloadResult, UpdateCandidate};
use crate::libs::rotation;
use crate::libs::version;
use crate::{msg_info, msg_warning};
use futures::StreamExt;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Semaphore};

/// Extension of in-flight downloads.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Total attempts per download, including the first.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff ceiling between attempts.
const BACKOFF_CAP_SECS: u64 = 30;

/// Observes download progress; injected by the CLI layer.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, app_name: &str, downloaded: u64, total: Option<u64>);
}

/// Reporter that ignores everything; used in batch and test runs.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&self, _app_name: &str, _downloaded: u64, _total: Option<u64>) {}
}

/// Incremental hasher over the configured algorithm.
enum Hasher {
    Sha256(Sha256),
    Sha1(Sha1),
    Md5(Md5),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Hasher {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Md5 => Hasher::Md5(Md5::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(bytes),
            Hasher::Sha1(h) => h.update(bytes),
            Hasher::Md5(h) => h.update(bytes),
        }
    }

    fn finish(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Sha1(h) => format!("{:x}", h.finalize()),
            Hasher::Md5(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Hex digest of a file under the given algorithm.
pub fn hash_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, UpdateError> {
    let mut file = File::open(path)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", path.display())))?;
    let mut hasher = Hasher::new(algorithm);
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buf)
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", path.display())))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hasher.finish())
}

/// Extracts the expected hash for `asset_name` from a checksum document.
///
/// Accepts `<hash> <filename>` / `<hash> *<filename>` lines (the filename
/// match decides, or a single line applies unconditionally) and bare-hash
/// documents.
pub fn parse_checksum_file(text: &str, asset_name: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let mut single_line_hash = None;
    for line in &lines {
        let mut parts = line.split_whitespace();
        let hash = parts.next()?;
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        match parts.next() {
            Some(filename) => {
                let filename = filename.trim_start_matches('*');
                if filename == asset_name {
                    return Some(hash.to_lowercase());
                }
                if lines.len() == 1 {
                    single_line_hash = Some(hash.to_lowercase());
                }
            }
            None => {
                // Bare hash document.
                if lines.len() == 1 {
                    single_line_hash = Some(hash.to_lowercase());
                }
            }
        }
    }
    single_line_hash
}

/// Finds the first `.AppImage` entry in a ZIP archive and extracts it into
/// `dest_dir`, collapsing intermediate directories. Deletes the archive on
/// success; on a miss the archive stays in place and the error carries the
/// listing.
pub fn extract_appimage_from_zip(zip_path: &Path, dest_dir: &Path) -> Result<PathBuf, UpdateError> {
    let file = File::open(zip_path)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", zip_path.display())))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", zip_path.display())))?;

    let mut listing = Vec::with_capacity(archive.len());
    let mut matches = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", zip_path.display())))?;
        let name = entry.name().to_string();
        if !name.ends_with('/') {
            if name.to_lowercase().ends_with(".appimage") {
                matches.push(index);
            }
            listing.push(name);
        }
    }

    let Some(&first) = matches.first() else {
        return Err(UpdateError::NoAppImageInArchive {
            archive: zip_path.display().to_string(),
            listing,
        });
    };
    if matches.len() > 1 {
        msg_warning!(Message::MultipleAppImagesInArchive(
            zip_path.display().to_string()
        ));
    }

    let mut entry = archive
        .by_index(first)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", zip_path.display())))?;
    let inner_name = entry
        .enclosed_name()
        .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        .ok_or_else(|| UpdateError::Filesystem("archive entry has no filename".to_string()))?;
    let dest = dest_dir.join(inner_name);
    let mut out = File::create(&dest)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", dest.display())))?;
    std::io::copy(&mut entry, &mut out)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", dest.display())))?;
    drop(entry);
    drop(archive);

    fs::remove_file(zip_path)
        .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", zip_path.display())))?;
    Ok(dest)
}

/// Sets the user-execute bit.
pub fn make_executable(path: &Path) -> Result<(), UpdateError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path)
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", path.display())))?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(permissions.mode() | 0o100);
        fs::set_permissions(path, permissions)
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", path.display())))?;
    }
    Ok(())
}

/// Executes the per-application download pipeline.
pub struct DownloadEngine {
    http: Arc<HttpFacility>,
    semaphore: Arc<Semaphore>,
    cancel: watch::Receiver<bool>,
    progress: Arc<dyn ProgressReporter>,
}

impl DownloadEngine {
    pub fn new(
        http: Arc<HttpFacility>,
        concurrent_downloads: u32,
        cancel: watch::Receiver<bool>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            http,
            semaphore: Arc::new(Semaphore::new(concurrent_downloads.max(1) as usize)),
            cancel,
            progress,
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Runs the whole pipeline for one candidate, converting every failure
    /// into a typed result.
    ///
    /// ## Pipeline
    ///
    /// 1. **Slot acquisition**: waits for a semaphore permit so no more
    ///    than the configured number of downloads is in flight
    /// 2. **Streaming fetch**: writes `<asset>.partial` chunk by chunk with
    ///    progress reporting and retry-with-backoff on transport failures
    /// 3. **Checksum verification**: fetches the published checksum file,
    ///    parses it, and hashes the partial file
    /// 4. **ZIP unwrapping**: extracts the first AppImage entry when the
    ///    asset is a ZIP archive, then deletes the archive
    /// 5. **Installation**: marks the file executable and records the
    ///    upstream version in the `.info` sidecar
    /// 6. **Rotation**: shifts previous generations, activates the new
    ///    `.current` file, and retargets the launch symlink
    ///
    /// ## Failure semantics
    ///
    /// - Partial files are always removed on failure
    /// - A required checksum mismatch fails the download; an optional one
    ///   warns and proceeds
    /// - A rotation failure never removes the successfully downloaded
    ///   file; the `.current` state on disk remains the source of truth
    /// - Cancellation is observed between chunks and before each stage,
    ///   but never once the rotation rename sequence has begun
    pub async fn download(&self, app: &ResolvedApp, candidate: &UpdateCandidate) -> DownloadResult {
        let started = Instant::now();
        match self.run_pipeline(app, candidate).await {
            Ok((path, size, checksum)) => DownloadResult {
                app_name: app.name.clone(),
                path: Some(path),
                size,
                duration: started.elapsed(),
                checksum,
                error: None,
            },
            Err(err) => DownloadResult {
                app_name: app.name.clone(),
                path: None,
                size: None,
                duration: started.elapsed(),
                checksum: if matches!(err, UpdateError::ChecksumMismatch { .. }) {
                    ChecksumOutcome::Failed
                } else {
                    ChecksumOutcome::Skipped
                },
                error: Some(err.to_string()),
            },
        }
    }

    async fn run_pipeline(
        &self,
        app: &ResolvedApp,
        candidate: &UpdateCandidate,
    ) -> Result<(PathBuf, Option<u64>, ChecksumOutcome), UpdateError> {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| UpdateError::Cancelled)?;
        if self.cancelled() {
            return Err(UpdateError::Cancelled);
        }

        fs::create_dir_all(&app.download_dir).map_err(|err| {
            UpdateError::Filesystem(format!("{}: {err}", app.download_dir.display()))
        })?;
        let final_path = app.download_dir.join(&candidate.asset.name);
        let partial = {
            let mut name = final_path.as_os_str().to_os_string();
            name.push(PARTIAL_SUFFIX);
            PathBuf::from(name)
        };

        msg_info!(Message::DownloadStarted(
            app.name.clone(),
            candidate.asset.name.clone()
        ));
        let size = self
            .fetch_with_retry(&candidate.asset.url, &partial, &app.name)
            .await
            .inspect_err(|_| {
                let _ = fs::remove_file(&partial);
            })?;

        let checksum_outcome = match self.verify_checksum(app, candidate, &partial).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Partial files never survive a failure.
                let _ = fs::remove_file(&partial);
                return Err(err);
            }
        };

        fs::rename(&partial, &final_path).map_err(|err| {
            UpdateError::Filesystem(format!("{}: {err}", final_path.display()))
        })?;

        let mut installed = final_path.clone();
        if candidate.asset.is_zip() {
            installed = extract_appimage_from_zip(&final_path, &app.download_dir)?;
        }

        make_executable(&installed)?;
        version::write_sidecar(&installed, &candidate.latest_version)?;

        if app.rotation_enabled {
            // Point of no return: the rename sequence ignores cancellation.
            let current = rotation::rotate_into(&installed, app.retain_count)?;
            msg_info!(Message::RotationCompleted(
                app.name.clone(),
                current
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ));
            if let Some(symlink) = &app.symlink_path {
                rotation::update_symlink(symlink, &current)?;
                msg_info!(Message::SymlinkUpdated(
                    symlink.display().to_string(),
                    current.display().to_string()
                ));
            }
            installed = current;
        }

        Ok((installed, size, checksum_outcome))
    }

    /// Streams the asset to the partial path, retrying transport failures
    /// with exponential backoff.
    async fn fetch_with_retry(
        &self,
        url: &str,
        partial: &Path,
        app_name: &str,
    ) -> Result<Option<u64>, UpdateError> {
        let mut last_error = UpdateError::Transport("no attempt made".to_string());
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = (1u64 << attempt).min(BACKOFF_CAP_SECS);
                msg_info!(Message::DownloadRetry {
                    attempt: attempt + 1,
                    delay_secs: delay,
                });
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
            if self.cancelled() {
                return Err(UpdateError::Cancelled);
            }
            match self.stream_once(url, partial, app_name).await {
                Ok(size) => return Ok(size),
                Err(UpdateError::Cancelled) => return Err(UpdateError::Cancelled),
                Err(err) if err.is_retryable() => {
                    tracing::debug!(url, error = %err, "download attempt failed");
                    last_error = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error)
    }

    async fn stream_once(
        &self,
        url: &str,
        partial: &Path,
        app_name: &str,
    ) -> Result<Option<u64>, UpdateError> {
        let response = self.http.fetch(url, Purpose::Download).await?;
        if !response.status().is_success() {
            return Err(UpdateError::UpstreamUnavailable(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        let total = response.content_length();
        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", partial.display())))?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            if self.cancelled() {
                drop(file);
                let _ = fs::remove_file(partial);
                return Err(UpdateError::Cancelled);
            }
            let chunk = chunk.map_err(|err| UpdateError::Transport(err.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", partial.display())))?;
            downloaded += chunk.len() as u64;
            self.progress.on_progress(app_name, downloaded, total);
        }
        file.flush()
            .await
            .map_err(|err| UpdateError::Filesystem(format!("{}: {err}", partial.display())))?;
        // A short body is a transport failure and therefore retryable.
        if let Some(expected) = total {
            if downloaded != expected {
                let _ = fs::remove_file(partial);
                return Err(UpdateError::Transport(format!(
                    "{url}: body truncated at {downloaded} of {expected} bytes"
                )));
            }
        }
        Ok(total.or(Some(downloaded)))
    }

    /// Fetches and checks the published checksum for the downloaded bytes.
    ///
    /// A mismatch deletes the partial file; whether it fails the download
    /// depends on `checksum.required`. Missing checksum data only warns.
    async fn verify_checksum(
        &self,
        app: &ResolvedApp,
        candidate: &UpdateCandidate,
        partial: &Path,
    ) -> Result<ChecksumOutcome, UpdateError> {
        if !app.checksum.enabled {
            return Ok(ChecksumOutcome::Skipped);
        }
        let Some(checksum_asset) = &candidate.checksum_asset else {
            if app.checksum.required {
                return Err(UpdateError::ChecksumMismatch {
                    filename: candidate.asset.name.clone(),
                    expected: "(no checksum file published)".to_string(),
                    actual: String::new(),
                });
            }
            msg_warning!(Message::ChecksumMissingWarning(candidate.asset.name.clone()));
            return Ok(ChecksumOutcome::Skipped);
        };

        let response = self
            .http
            .fetch(&checksum_asset.url, Purpose::Fallback)
            .await?;
        if !response.status().is_success() {
            return Err(UpdateError::UpstreamUnavailable(format!(
                "{}: HTTP {}",
                checksum_asset.url,
                response.status()
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|err| UpdateError::Transport(err.to_string()))?;
        let Some(expected) = parse_checksum_file(&text, &candidate.asset.name) else {
            if app.checksum.required {
                return Err(UpdateError::ChecksumMismatch {
                    filename: candidate.asset.name.clone(),
                    expected: "(no matching entry in checksum file)".to_string(),
                    actual: String::new(),
                });
            }
            msg_warning!(Message::ChecksumMissingWarning(candidate.asset.name.clone()));
            return Ok(ChecksumOutcome::Skipped);
        };

        let actual = hash_file(partial, app.checksum.algorithm)?;
        let result = ChecksumResult {
            verified: actual == expected,
            algorithm: app.checksum.algorithm,
            expected: expected.clone(),
            actual: actual.clone(),
            error: None,
        };
        if result.verified {
            tracing::debug!(file = %candidate.asset.name, algorithm = app.checksum.algorithm.label(), "checksum verified");
            return Ok(ChecksumOutcome::Verified);
        }
        if app.checksum.required {
            let _ = fs::remove_file(partial);
            return Err(UpdateError::ChecksumMismatch {
                filename: candidate.asset.name.clone(),
                expected,
                actual,
            });
        }
        msg_warning!(Message::ChecksumMismatchWarning(candidate.asset.name.clone()));
        Ok(ChecksumOutcome::Failed)
    }
}
