//! Configuration store for the update manager.
//!
//! The store is the single source of truth for everything the pipeline
//! does: one global document with transport settings and defaults for new
//! applications, plus one document per registered application. The
//! orchestrator consumes a fully-resolved snapshot and never mutates it;
//! mutation happens only through the explicit add/edit/remove commands.
//!
//! ## Storage layout
//!
//! ```text
//! config.json          # GlobalConfig
//! apps/<name>.json     # { "applications": [ ApplicationConfig ] }
//! ```
//!
//! The one-element `applications` sequence is retained for forward
//! compatibility with a future multi-app file format.
//!
//! ## Effective values
//!
//! Per-application fields are optional overrides. Resolution merges three
//! layers: built-in defaults, then global defaults, then per-app explicit
//! values. [`ConfigSnapshot::resolve`] produces the merged view as a
//! [`ResolvedApp`] with compiled patterns and absolute paths.
//!
//! Invariant-preserving validation runs at load and at save: patterns must
//! compile, symlink targets must end in `.AppImage`, names must be unique
//! case-insensitively, and rotation requires a symlink path.

use crate::libs::data_storage::{contract_tilde, expand_tilde, DataStorage};
use crate::libs::error::UpdateError;
use crate::libs::pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Configuration file name for the global document.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Hash algorithms accepted for checksum verification.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha1,
    Md5,
}

impl ChecksumAlgorithm {
    pub fn label(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }
}

/// Checksum verification settings, per application or as global defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChecksumConfig {
    pub enabled: bool,
    pub algorithm: ChecksumAlgorithm,
    /// Template naming the checksum file, with `{filename}` substituted by
    /// the asset filename.
    pub pattern: String,
    /// When true a mismatch fails the download; otherwise it only warns.
    pub required: bool,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        ChecksumConfig {
            enabled: true,
            algorithm: ChecksumAlgorithm::Sha256,
            pattern: "{filename}-SHA256.txt".to_string(),
            required: false,
        }
    }
}

/// Upstream source variants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceType {
    #[serde(rename = "forge-api-github")]
    GithubApi,
    #[serde(rename = "forge-api-gitlab")]
    GitlabApi,
    #[serde(rename = "sourceforge")]
    SourceForge,
    #[serde(rename = "direct")]
    Direct,
    #[serde(rename = "dynamic")]
    Dynamic,
}

impl SourceType {
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::GithubApi => "forge-api-github",
            SourceType::GitlabApi => "forge-api-gitlab",
            SourceType::SourceForge => "sourceforge",
            SourceType::Direct => "direct",
            SourceType::Dynamic => "dynamic",
        }
    }
}

/// Defaults applied to applications that do not override them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GlobalDefaults {
    /// Root for download directories; None means the current directory.
    pub download_dir: Option<String>,
    /// Give each application its own subdirectory under the root.
    pub auto_subdir: bool,
    pub rotation_enabled: bool,
    pub retain_count: u32,
    pub symlink_enabled: bool,
    pub symlink_dir: Option<String>,
    /// Symlink filename template with `{appname}` substituted.
    pub symlink_pattern: String,
    pub checksum_enabled: bool,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub checksum_pattern: String,
    pub checksum_required: bool,
    pub prerelease: bool,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        GlobalDefaults {
            download_dir: None,
            auto_subdir: true,
            rotation_enabled: false,
            retain_count: 3,
            symlink_enabled: false,
            symlink_dir: None,
            symlink_pattern: "{appname}.AppImage".to_string(),
            checksum_enabled: true,
            checksum_algorithm: ChecksumAlgorithm::Sha256,
            checksum_pattern: "{filename}-SHA256.txt".to_string(),
            checksum_required: false,
            prerelease: false,
        }
    }
}

/// Global transport settings and application defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GlobalConfig {
    /// Maximum in-flight downloads (1-10).
    pub concurrent_downloads: u32,
    /// Base HTTP timeout in seconds (5-300); the download tier uses ten
    /// times this value capped at 300.
    pub timeout_seconds: u64,
    pub user_agent: String,
    #[serde(default)]
    pub defaults: GlobalDefaults,
    /// Last-resort auth token for forge APIs; environment variables and the
    /// token sidecar file take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            concurrent_downloads: 3,
            timeout_seconds: 30,
            user_agent: format!("appimage-updater/{}", env!("CARGO_PKG_VERSION")),
            defaults: GlobalDefaults::default(),
            auth_token: None,
        }
    }
}

/// One registered application.
///
/// Optional fields fall back to the global defaults during resolution and
/// are omitted from the stored document when unset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApplicationConfig {
    /// Unique name; uniqueness is case-insensitive.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    pub url: String,
    /// Treat the URL as a single downloadable artifact.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub direct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
    /// Anchored regex matching release asset filenames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Optional regex filtering release tags and extracting versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pattern: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_count: Option<u32>,
    /// Absolute `.AppImage` path; required when rotation is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumConfig>,
}

fn default_true() -> bool {
    true
}

impl ApplicationConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> ApplicationConfig {
        ApplicationConfig {
            name: name.into(),
            source_type: None,
            url: url.into(),
            direct: false,
            download_dir: None,
            pattern: None,
            version_pattern: None,
            enabled: true,
            prerelease: None,
            rotation_enabled: None,
            retain_count: None,
            symlink_path: None,
            checksum: None,
        }
    }
}

/// Per-app document wrapper; a one-element sequence today.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct AppDocument {
    applications: Vec<ApplicationConfig>,
}

/// Fully-merged view of one application, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct ResolvedApp {
    pub name: String,
    pub source_type: Option<SourceType>,
    pub url: String,
    pub direct: bool,
    pub pattern: Regex,
    pub version_pattern: Option<Regex>,
    pub enabled: bool,
    pub prerelease: bool,
    pub rotation_enabled: bool,
    pub retain_count: u32,
    pub download_dir: PathBuf,
    pub symlink_path: Option<PathBuf>,
    pub checksum: ChecksumConfig,
}

/// Immutable view of the whole configuration for one run.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub global: GlobalConfig,
    pub apps: Vec<ApplicationConfig>,
}

impl ConfigSnapshot {
    /// Case-insensitive lookup by application name.
    pub fn find(&self, name: &str) -> Option<&ApplicationConfig> {
        self.apps
            .iter()
            .find(|app| app.name.eq_ignore_ascii_case(name))
    }

    /// Merges defaults into one application and compiles its patterns.
    pub fn resolve(&self, app: &ApplicationConfig) -> Result<ResolvedApp, UpdateError> {
        let defaults = &self.global.defaults;
        let pattern_source = app
            .pattern
            .clone()
            .unwrap_or_else(|| pattern::pattern_from_name(&app.name));
        let pattern = Regex::new(&pattern_source)
            .map_err(|err| UpdateError::Config(format!("{}: invalid pattern: {err}", app.name)))?;
        let version_pattern = match &app.version_pattern {
            Some(vp) => Some(Regex::new(vp).map_err(|err| {
                UpdateError::Config(format!("{}: invalid version pattern: {err}", app.name))
            })?),
            None => None,
        };
        let rotation_enabled = app.rotation_enabled.unwrap_or(defaults.rotation_enabled);
        let symlink_path = self.resolve_symlink_path(app, rotation_enabled);
        Ok(ResolvedApp {
            name: app.name.clone(),
            source_type: app.source_type,
            url: app.url.clone(),
            direct: app.direct || app.source_type == Some(SourceType::Direct),
            pattern,
            version_pattern,
            enabled: app.enabled,
            prerelease: app.prerelease.unwrap_or(defaults.prerelease),
            rotation_enabled,
            retain_count: app.retain_count.unwrap_or(defaults.retain_count),
            download_dir: self.resolve_download_dir(app),
            symlink_path,
            checksum: app.checksum.clone().unwrap_or_else(|| ChecksumConfig {
                enabled: defaults.checksum_enabled,
                algorithm: defaults.checksum_algorithm,
                pattern: defaults.checksum_pattern.clone(),
                required: defaults.checksum_required,
            }),
        })
    }

    /// Resolves every enabled-or-not application, failing fast on the first
    /// invalid document.
    pub fn resolve_all(&self) -> Result<Vec<ResolvedApp>, UpdateError> {
        self.apps.iter().map(|app| self.resolve(app)).collect()
    }

    /// Download directory resolution.
    ///
    /// An absolute per-app directory (after tilde expansion) wins. A
    /// relative one is resolved against the global root. When no per-app
    /// directory is set, the global root is used, with a per-app
    /// subdirectory appended when `auto_subdir` is on. Without a global
    /// root the current working directory is the base.
    fn resolve_download_dir(&self, app: &ApplicationConfig) -> PathBuf {
        let root = match &self.global.defaults.download_dir {
            Some(dir) => expand_tilde(dir),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        match &app.download_dir {
            Some(dir) => {
                let expanded = expand_tilde(dir);
                if expanded.is_absolute() {
                    expanded
                } else {
                    root.join(expanded)
                }
            }
            None => {
                if self.global.defaults.auto_subdir {
                    root.join(&app.name)
                } else {
                    root
                }
            }
        }
    }

    fn resolve_symlink_path(&self, app: &ApplicationConfig, rotation: bool) -> Option<PathBuf> {
        if let Some(path) = &app.symlink_path {
            return Some(expand_tilde(path));
        }
        if !rotation || !self.global.defaults.symlink_enabled {
            return None;
        }
        let dir = self.global.defaults.symlink_dir.as_ref()?;
        let name = self
            .global
            .defaults
            .symlink_pattern
            .replace("{appname}", &app.name);
        Some(expand_tilde(dir).join(name))
    }
}

/// Reads and writes the configuration documents.
pub struct ConfigStore {
    storage: DataStorage,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            storage: DataStorage::new(),
        }
    }

    /// Uses a non-default storage base, for tests.
    pub fn with_storage(storage: DataStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &DataStorage {
        &self.storage
    }

    /// Loads the global document and every application document, validating
    /// the whole set.
    ///
    /// ## Behavior
    ///
    /// - **Missing global document**: built-in defaults are used, so the
    ///   tool works before `init` has ever run
    /// - **Missing `apps/` directory**: created empty on first access
    /// - **Document order**: application files are read in sorted path
    ///   order for deterministic snapshots
    ///
    /// ## Errors
    ///
    /// Fails with `ConfigError` on a malformed document, an invariant
    /// violation (pattern does not compile, duplicate name, bad symlink
    /// target), or an I/O failure. A snapshot is only returned when the
    /// whole set validated.
    pub fn load(&self) -> Result<ConfigSnapshot, UpdateError> {
        let global = self.load_global()?;
        let mut apps = Vec::new();
        let apps_dir = self
            .storage
            .apps_dir()
            .map_err(|err| UpdateError::Config(err.to_string()))?;
        let mut entries: Vec<PathBuf> = fs::read_dir(&apps_dir)
            .map_err(|err| UpdateError::Config(err.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();
        for path in entries {
            let text = fs::read_to_string(&path)
                .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
            let document: AppDocument = serde_json::from_str(&text)
                .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
            apps.extend(document.applications);
        }
        let snapshot = ConfigSnapshot { global, apps };
        validate_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    fn load_global(&self) -> Result<GlobalConfig, UpdateError> {
        let path = self
            .storage
            .get_path(CONFIG_FILE_NAME)
            .map_err(|err| UpdateError::Config(err.to_string()))?;
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        let text = fs::read_to_string(&path)
            .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
        let global: GlobalConfig = serde_json::from_str(&text)
            .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
        validate_global(&global)?;
        Ok(global)
    }

    /// Persists the global document atomically.
    pub fn save_global(&self, global: &GlobalConfig) -> Result<(), UpdateError> {
        validate_global(global)?;
        let path = self
            .storage
            .get_path(CONFIG_FILE_NAME)
            .map_err(|err| UpdateError::Config(err.to_string()))?;
        write_atomic(&path, global)
    }

    /// Adds a new application, rejecting duplicate names.
    pub fn add_app(&self, app: &ApplicationConfig) -> Result<(), UpdateError> {
        let snapshot = self.load()?;
        if snapshot.find(&app.name).is_some() {
            return Err(UpdateError::Config(format!(
                "an application named '{}' already exists",
                app.name
            )));
        }
        self.save_app_checked(&snapshot, app)
    }

    /// Rewrites an existing application document.
    pub fn save_app(&self, app: &ApplicationConfig) -> Result<(), UpdateError> {
        let snapshot = self.load()?;
        self.save_app_checked(&snapshot, app)
    }

    fn save_app_checked(
        &self,
        snapshot: &ConfigSnapshot,
        app: &ApplicationConfig,
    ) -> Result<(), UpdateError> {
        let mut app = app.clone();
        normalize_paths(&mut app);
        validate_app(&app)?;
        // Symlink targets may not be shared between applications.
        if let Some(link) = &app.symlink_path {
            for other in &snapshot.apps {
                if other.name.eq_ignore_ascii_case(&app.name) {
                    continue;
                }
                if other.symlink_path.as_deref() == Some(link.as_str()) {
                    return Err(UpdateError::Config(format!(
                        "symlink path '{}' is already used by '{}'",
                        link, other.name
                    )));
                }
            }
        }
        let path = self
            .storage
            .app_file(&storage_name(&app.name))
            .map_err(|err| UpdateError::Config(err.to_string()))?;
        write_atomic(
            &path,
            &AppDocument {
                applications: vec![app],
            },
        )
    }

    /// Removes an application document; the name lookup is case-insensitive.
    pub fn remove_app(&self, name: &str) -> Result<(), UpdateError> {
        let snapshot = self.load()?;
        let app = snapshot
            .find(name)
            .ok_or_else(|| UpdateError::Config(format!("application '{}' is not configured", name)))?;
        let path = self
            .storage
            .app_file(&storage_name(&app.name))
            .map_err(|err| UpdateError::Config(err.to_string()))?;
        fs::remove_file(&path)
            .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
        Ok(())
    }
}

/// Filesystem name for an app document.
fn storage_name(name: &str) -> String {
    name.to_lowercase()
}

/// Serializes a document to `<path>.tmp`, fsyncs, then renames over the
/// target so readers never observe a torn document.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), UpdateError> {
    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp)
        .map_err(|err| UpdateError::Config(format!("{}: {err}", tmp.display())))?;
    serde_json::to_writer_pretty(&file, value)
        .map_err(|err| UpdateError::Config(format!("{}: {err}", tmp.display())))?;
    file.sync_all()
        .map_err(|err| UpdateError::Config(format!("{}: {err}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|err| UpdateError::Config(format!("{}: {err}", path.display())))?;
    Ok(())
}

/// Stored paths are kept in tilde form when they live under `$HOME`.
fn normalize_paths(app: &mut ApplicationConfig) {
    if let Some(dir) = &app.download_dir {
        let expanded = expand_tilde(dir);
        if expanded.is_absolute() {
            app.download_dir = Some(contract_tilde(&expanded));
        }
    }
    if let Some(link) = &app.symlink_path {
        app.symlink_path = Some(contract_tilde(&expand_tilde(link)));
    }
}

fn validate_global(global: &GlobalConfig) -> Result<(), UpdateError> {
    if !(1..=10).contains(&global.concurrent_downloads) {
        return Err(UpdateError::Config(
            "concurrent_downloads must be between 1 and 10".to_string(),
        ));
    }
    if !(5..=300).contains(&global.timeout_seconds) {
        return Err(UpdateError::Config(
            "timeout_seconds must be between 5 and 300".to_string(),
        ));
    }
    if !(1..=10).contains(&global.defaults.retain_count) {
        return Err(UpdateError::Config(
            "retain_count must be between 1 and 10".to_string(),
        ));
    }
    Ok(())
}

/// Per-application invariants.
pub fn validate_app(app: &ApplicationConfig) -> Result<(), UpdateError> {
    if app.name.trim().is_empty() {
        return Err(UpdateError::Config("application name is empty".to_string()));
    }
    if app.url.trim().is_empty() {
        return Err(UpdateError::Config(format!("{}: url is empty", app.name)));
    }
    if let Some(pattern) = &app.pattern {
        Regex::new(pattern)
            .map_err(|err| UpdateError::Config(format!("{}: invalid pattern: {err}", app.name)))?;
    }
    if let Some(vp) = &app.version_pattern {
        Regex::new(vp).map_err(|err| {
            UpdateError::Config(format!("{}: invalid version pattern: {err}", app.name))
        })?;
    }
    if let Some(retain) = app.retain_count {
        if !(1..=10).contains(&retain) {
            return Err(UpdateError::Config(format!(
                "{}: retain_count must be between 1 and 10",
                app.name
            )));
        }
    }
    if let Some(link) = &app.symlink_path {
        if link.contains('\0') || link.contains('\n') {
            return Err(UpdateError::Config(format!(
                "{}: symlink path contains an invalid character",
                app.name
            )));
        }
        if !link.ends_with(".AppImage") {
            return Err(UpdateError::Config(format!(
                "{}: symlink path must end with .AppImage",
                app.name
            )));
        }
    }
    if app.rotation_enabled == Some(true) && app.symlink_path.is_none() {
        return Err(UpdateError::Config(format!(
            "{}: rotation requires a symlink path",
            app.name
        )));
    }
    Ok(())
}

/// Whole-set invariants, run after every load.
fn validate_snapshot(snapshot: &ConfigSnapshot) -> Result<(), UpdateError> {
    let mut seen = HashSet::new();
    for app in &snapshot.apps {
        validate_app(app)?;
        if !seen.insert(app.name.to_lowercase()) {
            return Err(UpdateError::Config(format!(
                "duplicate application name '{}'",
                app.name
            )));
        }
    }
    // Shared symlink targets load with a warning and behave
    // last-writer-wins; add/edit rejects them outright.
    let mut links = HashSet::new();
    for app in &snapshot.apps {
        if let Some(link) = &app.symlink_path {
            if !links.insert(link.clone()) {
                tracing::warn!(symlink = %link, "symlink path shared between applications");
            }
        }
    }
    Ok(())
}
