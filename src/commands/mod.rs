//! Command-line interface for the update manager.
//!
//! Thin dispatch layer: every subcommand lives in its own module, loads the
//! configuration store, calls into the core pipeline, and renders the typed
//! results. The core itself never prints.
//!
//! ## Usage
//!
//! ```bash
//! appimage-updater add FreeCAD https://github.com/FreeCAD/FreeCAD
//! appimage-updater check               # what would update
//! appimage-updater update              # download and rotate
//! appimage-updater list
//! ```

pub mod add;
pub mod check;
pub mod edit;
pub mod init;
pub mod list;
pub mod remove;
pub mod show;
pub mod update;

use crate::libs::messages::Message;
use crate::libs::release::Asset;
use crate::libs::selector::InteractiveSelector;
use anyhow::Result;
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};

/// Defines the main subcommands that the application can execute.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a new application to keep updated
    #[command(about = "Add an application")]
    Add(add::AddArgs),

    /// Change stored settings of an application
    #[command(about = "Edit an application")]
    Edit(edit::EditArgs),

    /// Forget an application (downloaded files stay on disk)
    #[command(about = "Remove an application")]
    Remove(remove::RemoveArgs),

    /// Overview of all configured applications
    #[command(about = "List configured applications")]
    List,

    /// Full effective configuration of one application
    #[command(about = "Show an application's effective configuration")]
    Show(show::ShowArgs),

    /// Resolve and compare versions without downloading anything
    #[command(about = "Check for available updates")]
    Check(check::CheckArgs),

    /// Download, verify, and rotate everything that has an update
    #[command(about = "Download available updates")]
    Update(update::UpdateArgs),

    /// Interactive setup of the global configuration
    #[command(about = "Initialize global configuration")]
    Init,
}

/// The main CLI structure that parses command-line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parses command-line arguments and executes the matching command.
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();

        match cli.command {
            Commands::Add(args) => add::cmd(args).await,
            Commands::Edit(args) => edit::cmd(args),
            Commands::Remove(args) => remove::cmd(args),
            Commands::List => list::cmd(),
            Commands::Show(args) => show::cmd(args),
            Commands::Check(args) => check::cmd(args).await,
            Commands::Update(args) => update::cmd(args).await,
            Commands::Init => init::cmd(),
        }
    }
}

/// Tie-breaking asset selector backed by a terminal prompt.
pub struct PromptSelector;

impl InteractiveSelector for PromptSelector {
    fn pick(&self, candidates: &[Asset]) -> Option<Asset> {
        let names: Vec<&str> = candidates.iter().map(|a| a.name.as_str()).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectAsset.to_string())
            .items(&names)
            .default(0)
            .interact()
            .ok()?;
        candidates.get(choice).cloned()
    }
}
