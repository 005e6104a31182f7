//! # AppImage Updater
//!
//! A command-line update manager for Linux AppImage applications. Each
//! registered application points at an upstream release source; the
//! pipeline resolves the newest release, downloads and verifies new
//! artifacts, and rotates them into a stable on-disk layout with a
//! predictable launch symlink.
//!
//! ## Features
//!
//! - **Source variants**: GitHub-like and GitLab-like forge APIs,
//!   SourceForge listings, direct file URLs, scraped download pages
//! - **Asset selection**: architecture/platform/format compatibility scoring
//! - **Integrity**: sha256/sha1/md5 checksum verification
//! - **Rotation**: `.current` / `.old<k>` version history with atomic
//!   symlink switching
//!
//! ## Usage
//!
//! ```rust,no_run
//! use appimage_updater::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
