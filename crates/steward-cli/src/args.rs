//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Storage directory name under the home directory when none is given.
pub const DEFAULT_STORAGE_DIR: &str = ".steward";

#[derive(Parser)]
#[command(name = "steward")]
#[command(about = "Steward - headless host for a conversational code-editing agent")]
#[command(
    long_about = r#"Steward - headless host for a conversational code-editing agent

USAGE:
  steward init                     # Create the storage directory and default settings
  steward task "your task"         # Run a task, approving steps at the terminal
  steward task --full-auto "task"  # Run unattended; approvals decided by policy
  steward task                     # Prompt for the task text

For detailed help: steward --help"#
)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the storage directory with default settings files
    Init {
        /// Storage directory (defaults to ~/.steward)
        #[arg(long)]
        storage: Option<PathBuf>,
    },

    /// Run one task to completion
    Task(TaskArgs),
}

#[derive(Args)]
pub struct TaskArgs {
    /// Task description (omit to be prompted)
    pub task: Option<String>,

    /// Workspace root the agent operates in (defaults to the current directory)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Storage directory holding settings and task history
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Settings file to apply instead of <storage>/settings.json
    #[arg(long)]
    pub settings_file: Option<PathBuf>,

    /// Custom instructions passed to the agent verbatim
    #[arg(long)]
    pub custom_instructions: Option<String>,

    /// File opened as a visible editor before the task starts (repeatable)
    #[arg(long = "visible-file")]
    pub visible_files: Vec<PathBuf>,

    /// Run unattended; every approval is decided by policy
    #[arg(long)]
    pub full_auto: bool,

    /// With --full-auto, approve MCP server requests
    #[arg(long, requires = "full_auto")]
    pub auto_approve_mcp: bool,

    /// Reopen the most recent task with the same text
    #[arg(long, conflicts_with = "resume_or_new")]
    pub resume: bool,

    /// Like --resume, but chain into a fresh task when the reopened
    /// one already completed
    #[arg(long)]
    pub resume_or_new: bool,
}
