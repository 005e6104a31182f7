//! Typed error kinds for every layer of the update pipeline.
//!
//! Each failure carries a kind and a human-readable message; the CLI surface
//! renders messages only, never stack traces. Kinds map onto process exit
//! codes: general/config failures exit 1, transport-class failures exit 2,
//! filesystem failures exit 3.

use thiserror::Error;

/// Process exit code for configuration and validation failures.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code for network and upstream failures.
pub const EXIT_NETWORK: i32 = 2;
/// Process exit code for filesystem failures.
pub const EXIT_FILESYSTEM: i32 = 3;

/// Error taxonomy for the update pipeline.
///
/// Repository clients produce the upstream kinds, the selector produces
/// `NoMatchingAsset`, the download engine produces the integrity and
/// extraction kinds, and the config store produces `Config`.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Malformed document, invariant violation, or I/O failure during save.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Raised early by host introspection on anything that is not linux.
    #[error("Unsupported platform '{0}': AppImage updates require linux")]
    PlatformUnsupported(String),

    /// The upstream source could not be reached or returned a server error.
    #[error("Upstream source unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream API refused the request due to rate limiting.
    #[error("Rate limited by upstream API")]
    RateLimited,

    /// The upstream API rejected the supplied credentials.
    #[error("Upstream authentication failed: {0}")]
    Auth(String),

    /// The configured repository or release feed does not exist.
    #[error("Release source not found: {0}")]
    NotFound(String),

    /// A scraped source contained nothing the client could interpret.
    #[error("Could not parse release source: {0}")]
    UnparseableSource(String),

    /// No release asset survived pattern matching and compatibility scoring.
    #[error("No release asset matches pattern '{pattern}'")]
    NoMatchingAsset { pattern: String },

    /// The downloaded bytes do not hash to the published checksum.
    #[error("Checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// A downloaded ZIP archive contained no AppImage entry.
    #[error("No AppImage found in archive {archive} (contents: {})", listing.join(", "))]
    NoAppImageInArchive {
        archive: String,
        listing: Vec<String>,
    },

    /// Connection, timeout, or protocol failure below the HTTP layer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A rename in the rotation sequence failed.
    #[error("Rotation failed: {0}")]
    Rotation(String),

    /// Any other filesystem failure.
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// The run was cancelled before this operation completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl UpdateError {
    /// Maps the error kind onto the process exit code documented for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            UpdateError::Config(_)
            | UpdateError::PlatformUnsupported(_)
            | UpdateError::NoMatchingAsset { .. }
            | UpdateError::Cancelled => EXIT_FAILURE,
            UpdateError::UpstreamUnavailable(_)
            | UpdateError::RateLimited
            | UpdateError::Auth(_)
            | UpdateError::NotFound(_)
            | UpdateError::UnparseableSource(_)
            | UpdateError::ChecksumMismatch { .. }
            | UpdateError::NoAppImageInArchive { .. }
            | UpdateError::Transport(_) => EXIT_NETWORK,
            UpdateError::Rotation(_) | UpdateError::Filesystem(_) => EXIT_FILESYSTEM,
        }
    }

    /// True for kinds the download engine retries with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpdateError::Transport(_) | UpdateError::UpstreamUnavailable(_)
        )
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        UpdateError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for UpdateError {
    fn from(err: std::io::Error) -> Self {
        UpdateError::Filesystem(err.to_string())
    }
}

impl From<regex::Error> for UpdateError {
    fn from(err: regex::Error) -> Self {
        UpdateError::Config(format!("invalid pattern: {err}"))
    }
}
