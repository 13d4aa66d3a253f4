//! Headless host shim
//!
//! In-process stand-ins for the editor-extension services the agent core
//! expects: workspace, open documents, window, commands, and secrets.
//! The agent was written against a stateful, UI-driven host; these
//! adapters give it file-backed, single-process, non-visual equivalents.
//!
//! Everything hangs off one explicit [`HostContext`] constructed once at
//! startup and threaded through every component's constructor. There is
//! deliberately no ambient global state here.

pub mod commands;
pub mod documents;
pub mod secrets;
pub mod window;
pub mod workspace;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::{CommandDisposable, CommandHandler, CommandRegistry};
pub use documents::{DocumentStore, TextDocument};
pub use secrets::SecretStore;
pub use window::WindowShim;
pub use workspace::{Position, Range, WorkspaceShim};

/// The one host value the rest of the system is built around
#[derive(Debug)]
pub struct HostContext {
    /// Workspace: root path, edits, merged configuration tree
    pub workspace: WorkspaceShim,
    /// Open document tabs with cached snapshots
    pub documents: Arc<DocumentStore>,
    /// Visible editors and user-facing notifications
    pub window: WindowShim,
    /// Named command registry
    pub commands: CommandRegistry,
    /// Opaque key/value secret storage
    pub secrets: SecretStore,
}

impl HostContext {
    /// Build a host rooted at the given workspace directory.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let root = workspace_root.into();
        let documents = Arc::new(DocumentStore::new());
        Self {
            workspace: WorkspaceShim::new(root),
            window: WindowShim::new(documents.clone()),
            documents,
            commands: CommandRegistry::new(),
            secrets: SecretStore::new(),
        }
    }

    /// The workspace root path.
    pub fn root(&self) -> &Path {
        self.workspace.root()
    }
}

/// Shared handle to the host, cloned into every consumer
pub type SharedHost = Arc<HostContext>;
