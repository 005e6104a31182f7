#[derive(Debug, Clone)]
pub enum Message {
    // === APPLICATION CONFIG MESSAGES ===
    AppAdded(String),
    AppUpdated(String),
    AppRemoved(String),
    AppNotFound(String),
    AppAlreadyExists(String),
    NoAppsConfigured,
    NoAppsMatchedFilter,
    ConfigSaved,
    ConfigInitialized(String),
    ConfirmRemoveApp(String),
    RemoveCancelled,
    PatternDerived(String),
    PatternFallback(String),

    // === CHECK MESSAGES ===
    CheckingApps(usize),
    CheckResultsHeader,
    UpdateAvailable {
        app_name: String,
        current: String,
        latest: String,
    },
    UpToDate(String),
    NoReleasesFound(String),
    PrereleaseOnlyUpstream(String),
    CheckFailed(String, String), // app, error
    DryRunNoDownloads(usize),

    // === DOWNLOAD MESSAGES ===
    DownloadResultsHeader,
    DownloadStarted(String, String), // app, asset name
    DownloadCompleted {
        app_name: String,
        path: String,
    },
    DownloadRetry {
        attempt: u32,
        delay_secs: u64,
    },
    NothingToDownload,
    ChecksumVerified(String),
    ChecksumMissingWarning(String),
    ChecksumMismatchWarning(String),
    MultipleAppImagesInArchive(String),
    RotationCompleted(String, String), // app, current file
    SymlinkUpdated(String, String),    // link, target
    RunCancelled(usize),               // unfinished app count

    // === INIT WIZARD PROMPTS ===
    PromptConcurrentDownloads,
    PromptTimeoutSeconds,
    PromptUserAgent,
    PromptDownloadDir,
    PromptAutoSubdir,
    PromptRotationEnabled,
    PromptRetainCount,
    PromptChecksumRequired,
    PromptPrerelease,
    PromptSelectAsset,

    // === GENERIC MESSAGES ===
    OperationCancelled,
    Custom(String),
}
