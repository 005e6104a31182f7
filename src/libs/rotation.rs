//! Version rotation and symlink management.
//!
//! Rotation keeps the active file at `<name>.current` with previous
//! versions at `.old`, `.old2`, ... in decreasing recency, at most
//! `retain_count` non-sidecar files in total. Each step is a single
//! rename-over-target so a crash can lose at most one slot, and `.info`
//! sidecars ride along with every rename. Once the first rename begins the
//! sequence always runs to completion; cancellation never interrupts it.

use crate::libs::error::UpdateError;
use crate::libs::version::sidecar_path;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the active rotated file.
pub const CURRENT_SUFFIX: &str = ".current";

/// Suffix for the k-th retired version: `.old` for 1, `.old2` for 2, ...
pub fn old_suffix(k: u32) -> String {
    if k <= 1 {
        ".old".to_string()
    } else {
        format!(".old{k}")
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Renames `from` to `to` (replacing `to` when present) and moves the
/// sidecar with it.
fn rename_with_sidecar(from: &Path, to: &Path) -> Result<(), UpdateError> {
    fs::rename(from, to).map_err(|err| {
        UpdateError::Rotation(format!("{} -> {}: {err}", from.display(), to.display()))
    })?;
    let from_info = sidecar_path(from);
    if from_info.exists() {
        let to_info = sidecar_path(to);
        fs::rename(&from_info, &to_info).map_err(|err| {
            UpdateError::Rotation(format!(
                "{} -> {}: {err}",
                from_info.display(),
                to_info.display()
            ))
        })?;
    }
    Ok(())
}

fn remove_with_sidecar(path: &Path) -> Result<(), UpdateError> {
    fs::remove_file(path)
        .map_err(|err| UpdateError::Rotation(format!("{}: {err}", path.display())))?;
    let info = sidecar_path(path);
    if info.exists() {
        fs::remove_file(&info)
            .map_err(|err| UpdateError::Rotation(format!("{}: {err}", info.display())))?;
    }
    Ok(())
}

/// Files in `dir` ending in exactly `suffix`, sidecars excluded.
///
/// `.old` does not match `.old2`: the suffix comparison is exact.
fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, UpdateError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| UpdateError::Rotation(format!("{}: {err}", dir.display())))?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix) && !name.ends_with(".info"))
        })
        .collect())
}

/// Replaces the trailing `suffix` of a path with `replacement`.
fn swap_suffix(path: &Path, suffix: &str, replacement: &str) -> PathBuf {
    let full = path.as_os_str().to_string_lossy();
    let base = full
        .strip_suffix(suffix)
        .unwrap_or(&full)
        .to_string();
    PathBuf::from(format!("{base}{replacement}"))
}

/// Rotates a freshly downloaded file into the `.current` slot.
///
/// The previous generations in the same directory shift down one slot
/// starting from the oldest (which is deleted together with its sidecar),
/// then the previous `.current` becomes `.old` and the new file takes
/// `.current`. Returns the path of the new `.current` file.
pub fn rotate_into(new_file: &Path, retain_count: u32) -> Result<PathBuf, UpdateError> {
    let retain = retain_count.max(1);
    let dir = new_file
        .parent()
        .ok_or_else(|| UpdateError::Rotation(format!("{} has no parent", new_file.display())))?;

    // Drop every slot at or past the retain count. Higher indexes can
    // exist after the retain count was lowered.
    for k in (retain.saturating_sub(1).max(1))..=10 {
        for stale in files_with_suffix(dir, &old_suffix(k))? {
            remove_with_sidecar(&stale)?;
        }
    }

    // Shift the surviving .old<k> slots in reverse order so no rename
    // clobbers a slot that still has to move.
    if retain > 2 {
        for k in (1..=retain - 2).rev() {
            let suffix = old_suffix(k);
            for from in files_with_suffix(dir, &suffix)? {
                let to = swap_suffix(&from, &suffix, &old_suffix(k + 1));
                rename_with_sidecar(&from, &to)?;
            }
        }
    }

    // Retire the active file.
    for current in files_with_suffix(dir, CURRENT_SUFFIX)? {
        if retain == 1 {
            remove_with_sidecar(&current)?;
        } else {
            let to = swap_suffix(&current, CURRENT_SUFFIX, &old_suffix(1));
            rename_with_sidecar(&current, &to)?;
        }
    }

    // Activate the new file.
    let current = with_suffix(new_file, CURRENT_SUFFIX);
    rename_with_sidecar(new_file, &current)?;
    Ok(current)
}

/// Retargets the launch symlink atomically.
///
/// The new link is created under a temporary name and renamed over the
/// target, so the path never dangles mid-switch. The link target is always
/// absolute.
pub fn update_symlink(symlink: &Path, target: &Path) -> Result<(), UpdateError> {
    let target = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| UpdateError::Rotation(err.to_string()))?
            .join(target)
    };
    if let Some(parent) = symlink.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| UpdateError::Rotation(format!("{}: {err}", parent.display())))?;
    }
    let staging = with_suffix(symlink, ".tmp");
    if staging.exists() || staging.symlink_metadata().is_ok() {
        let _ = fs::remove_file(&staging);
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&target, &staging).map_err(|err| {
        UpdateError::Rotation(format!("{}: {err}", staging.display()))
    })?;
    #[cfg(not(unix))]
    return Err(UpdateError::PlatformUnsupported(
        std::env::consts::OS.to_string(),
    ));
    #[cfg(unix)]
    {
        fs::rename(&staging, symlink).map_err(|err| {
            UpdateError::Rotation(format!(
                "{} -> {}: {err}",
                staging.display(),
                symlink.display()
            ))
        })?;
        Ok(())
    }
}

/// The `.current` file in a directory, when exactly one exists.
pub fn find_current(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(CURRENT_SUFFIX))
        })
}
