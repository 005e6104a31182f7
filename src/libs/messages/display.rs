//! Human-readable formatting for every [`Message`] variant.
//!
//! Keeping all user-facing text in one Display implementation makes the
//! wording easy to review and keeps the rest of the code free of string
//! literals.

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // === APPLICATION CONFIG MESSAGES ===
            Message::AppAdded(name) => write!(f, "Application '{}' added", name),
            Message::AppUpdated(name) => write!(f, "Application '{}' updated", name),
            Message::AppRemoved(name) => write!(f, "Application '{}' removed", name),
            Message::AppNotFound(name) => write!(f, "Application '{}' is not configured", name),
            Message::AppAlreadyExists(name) => {
                write!(f, "An application named '{}' already exists", name)
            }
            Message::NoAppsConfigured => {
                write!(f, "No applications configured. Add one with 'add <name> <url>'")
            }
            Message::NoAppsMatchedFilter => write!(f, "No configured application matches the filter"),
            Message::ConfigSaved => write!(f, "Configuration saved"),
            Message::ConfigInitialized(path) => write!(f, "Configuration written to {}", path),
            Message::ConfirmRemoveApp(name) => {
                write!(f, "Remove application '{}' and forget its settings?", name)
            }
            Message::RemoveCancelled => write!(f, "Nothing removed"),
            Message::PatternDerived(pattern) => {
                write!(f, "Derived asset pattern from upstream releases: {}", pattern)
            }
            Message::PatternFallback(pattern) => write!(
                f,
                "Upstream releases unavailable, using name-based pattern: {}",
                pattern
            ),

            // === CHECK MESSAGES ===
            Message::CheckingApps(count) => write!(f, "Checking {} application(s)...", count),
            Message::CheckResultsHeader => write!(f, "Update check results"),
            Message::UpdateAvailable {
                app_name,
                current,
                latest,
            } => write!(
                f,
                "{}: update available ({} -> {})",
                app_name, current, latest
            ),
            Message::UpToDate(name) => write!(f, "{}: up to date", name),
            Message::NoReleasesFound(name) => write!(f, "{}: no releases found", name),
            Message::PrereleaseOnlyUpstream(name) => write!(
                f,
                "{}: upstream publishes only prereleases, tracking latest prerelease",
                name
            ),
            Message::CheckFailed(name, error) => write!(f, "{}: check failed: {}", name, error),
            Message::DryRunNoDownloads(count) => {
                write!(f, "Dry run: {} update(s) available, nothing downloaded", count)
            }

            // === DOWNLOAD MESSAGES ===
            Message::DownloadResultsHeader => write!(f, "Download results"),
            Message::DownloadStarted(app, asset) => write!(f, "{}: downloading {}", app, asset),
            Message::DownloadCompleted { app_name, path } => {
                write!(f, "{}: installed {}", app_name, path)
            }
            Message::DownloadRetry { attempt, delay_secs } => write!(
                f,
                "Download failed, retrying (attempt {}) in {}s",
                attempt, delay_secs
            ),
            Message::NothingToDownload => write!(f, "All applications are up to date"),
            Message::ChecksumVerified(name) => write!(f, "Checksum verified for {}", name),
            Message::ChecksumMissingWarning(name) => write!(
                f,
                "No checksum file published for {}, skipping verification",
                name
            ),
            Message::ChecksumMismatchWarning(name) => write!(
                f,
                "Checksum mismatch for {} (checksum not required, keeping file)",
                name
            ),
            Message::MultipleAppImagesInArchive(name) => write!(
                f,
                "Archive {} contains several AppImages, extracting the first",
                name
            ),
            Message::RotationCompleted(app, current) => {
                write!(f, "{}: rotated, current version is {}", app, current)
            }
            Message::SymlinkUpdated(link, target) => {
                write!(f, "Symlink {} -> {}", link, target)
            }
            Message::RunCancelled(count) => {
                write!(f, "Run cancelled, {} application(s) not finished", count)
            }

            // === INIT WIZARD PROMPTS ===
            Message::PromptConcurrentDownloads => write!(f, "Concurrent downloads (1-10)"),
            Message::PromptTimeoutSeconds => write!(f, "HTTP timeout in seconds (5-300)"),
            Message::PromptUserAgent => write!(f, "User-Agent header"),
            Message::PromptDownloadDir => write!(f, "Default download directory"),
            Message::PromptAutoSubdir => write!(f, "Create a subdirectory per application?"),
            Message::PromptRotationEnabled => write!(f, "Enable version rotation by default?"),
            Message::PromptRetainCount => write!(f, "Old versions to retain (1-10)"),
            Message::PromptChecksumRequired => write!(f, "Fail downloads on checksum mismatch?"),
            Message::PromptPrerelease => write!(f, "Track prereleases by default?"),
            Message::PromptSelectAsset => write!(f, "Several assets match, pick one"),

            // === GENERIC MESSAGES ===
            Message::OperationCancelled => write!(f, "Operation cancelled"),
            Message::Custom(text) => write!(f, "{}", text),
        }
    }
}
