//! Steward CLI application
//!
//! Terminal front end for the headless agent host:
//!
//! - `steward init` bootstraps the storage directory with default
//!   settings files.
//! - `steward task "..."` runs one task, streaming the agent's output
//!   and taking approvals at the terminal (or deciding them by policy
//!   with `--full-auto`).

mod args;
mod commands;
mod console;
mod signal_handler;

use clap::Parser;
use steward_core::error::StewardResult;

use args::{Cli, Commands};
use console::CLIConsole;

#[tokio::main]
async fn main() -> StewardResult<()> {
    // Initialize logging with environment-based filtering.
    // Set RUST_LOG=debug for verbose logging; output goes to stderr so
    // it never interleaves with the streamed agent transcript.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let console = CLIConsole::new(cli.verbose);

    match cli.command {
        Commands::Init { storage } => commands::init::execute(storage, &console),
        Commands::Task(task_args) => {
            let exit = match commands::task::execute(task_args, &console).await {
                Ok(exit) => exit,
                Err(e) => {
                    console.error(&e.to_string());
                    return Err(e);
                }
            };
            std::process::exit(exit.code);
        }
    }
}
