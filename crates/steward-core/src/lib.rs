//! Steward Core Library
//!
//! This crate provides the headless host runtime for a conversational
//! code-editing agent: the host shim the agent runs against, the event
//! bridge it talks over, and the task controller that drives a run from
//! the terminal side.

pub mod agent;
pub mod bridge;
pub mod controller;
pub mod error;
pub mod history;
pub mod host;
pub mod protocol;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use agent::{AgentCore, AgentFactory, NoopAgent, OutputSink, TracingSink};
pub use bridge::{shared_bridge, EventBridge, SharedBridge};
pub use controller::{
    ControllerOptions, ExitRequest, Prompter, StreamPrinter, TaskController, Timings,
};
pub use error::{StewardError, StewardResult};
pub use history::{HistoryStore, TaskHistoryItem};
pub use host::{HostContext, SharedHost};
pub use protocol::{
    AgentEvent, ApprovalDecision, AskKind, AskResponse, ControlMessage, SayKind, TurnKind,
    TurnMessage,
};
pub use settings::SettingsFile;

/// Crate version, for diagnostics and the CLI banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
