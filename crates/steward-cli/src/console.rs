//! CLI console utilities

use async_trait::async_trait;
use colored::*;
use console::Term;

use steward_core::controller::Prompter;

/// CLI console for formatted output
pub struct CLIConsole {
    verbose: bool,
}

impl CLIConsole {
    /// Create a new CLI console
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose mode only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }
}

/// Prompter backed by the terminal
///
/// Reads happen on the blocking pool so the controller keeps draining
/// agent events while the user types.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn read_line(&self, prompt: &str) -> std::io::Result<String> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            let term = Term::stdout();
            term.write_str(&prompt)?;
            term.read_line()
        })
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
    }
}
