//! Configuration directory path management.
//!
//! All persistent state lives under one XDG-style configuration directory:
//!
//! ```text
//! $XDG_CONFIG_HOME/appimage-updater/    (else ~/.config/appimage-updater/)
//! ├── config.json          # global defaults, one document
//! ├── apps/<name>.json     # one document per application
//! └── .github_token        # optional auth token sidecar
//! ```
//!
//! Directories are created lazily on first access so the tool works before
//! any configuration exists. Tests redirect the whole tree by setting
//! `XDG_CONFIG_HOME`.

use anyhow::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the XDG config base.
pub const APP_DIR_NAME: &str = "appimage-updater";

/// Subdirectory holding per-application documents.
pub const APPS_DIR_NAME: &str = "apps";

/// Resolves and creates paths inside the configuration directory.
#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStorage {
    /// Resolves the configuration base for this process.
    ///
    /// ## Resolution order
    ///
    /// 1. **`XDG_CONFIG_HOME`**: explicit XDG override, used verbatim
    /// 2. **`HOME`**: the standard `~/.config` location
    /// 3. **Current directory**: last resort for restricted environments
    ///
    /// The environment is read on every construction rather than cached,
    /// which lets tests redirect the whole tree per test case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use appimage_updater::libs::data_storage::DataStorage;
    ///
    /// let storage = DataStorage::new();
    /// let config_path = storage.get_path("config.json")?;
    /// # anyhow::Ok(())
    /// ```
    pub fn new() -> Self {
        let base = match env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => match env::var("HOME") {
                Ok(home) if !home.is_empty() => Path::new(&home).join(".config"),
                _ => PathBuf::from("."),
            },
        };
        Self {
            base_path: base.join(APP_DIR_NAME),
        }
    }

    /// Uses an explicit base directory instead of the environment.
    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The configuration directory itself.
    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a file name inside the configuration directory, creating
    /// the directory tree when missing.
    pub fn get_path(&self, file_name: &str) -> Result<PathBuf> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)?;
        }
        Ok(self.base_path.join(file_name))
    }

    /// Resolves the `apps/` directory, creating it when missing.
    pub fn apps_dir(&self) -> Result<PathBuf> {
        let dir = self.base_path.join(APPS_DIR_NAME);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Path of the per-application document for `name`.
    pub fn app_file(&self, name: &str) -> Result<PathBuf> {
        Ok(self.apps_dir()?.join(format!("{}.json", name)))
    }
}

/// Expands a leading `~` or `~/` against `HOME`.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home);
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Rewrites an absolute path under the user's home directory back to
/// tilde form, so stored documents stay portable across machines.
pub fn contract_tilde(path: &Path) -> String {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            if let Ok(rest) = path.strip_prefix(&home) {
                if rest.as_os_str().is_empty() {
                    return "~".to_string();
                }
                return format!("~/{}", rest.display());
            }
        }
    }
    path.display().to_string()
}
