//! Consumed collaborator contracts
//!
//! The agent's reasoning lives elsewhere; this module only pins down the
//! interfaces the host consumes: the agent core itself, the factory the
//! CLI hands its wiring to, and the output sink the agent logs through.

use async_trait::async_trait;
use std::sync::Arc;

use crate::bridge::SharedBridge;
use crate::error::StewardResult;
use crate::host::SharedHost;

/// Handle to the agent core
///
/// `start_new_task` and `set_custom_instructions` belong to the
/// embedding that builds the agent; the controller itself only ever
/// uses `cancel_task` (the remote task-cancellation call) — tasks are
/// started over the bridge, never through this handle.
#[async_trait]
pub trait AgentCore: Send + Sync {
    async fn start_new_task(&self, text: &str) -> StewardResult<()>;

    async fn set_custom_instructions(&self, text: &str) -> StewardResult<()>;

    /// Ask the in-flight remote task to cancel. Cooperative: the task is
    /// asked, not forcibly interrupted.
    async fn cancel_task(&self) -> StewardResult<()>;
}

/// Factory the CLI uses to build the agent core bound to the host shim
/// and the bridge
pub type AgentFactory = Box<
    dyn FnOnce(Arc<dyn OutputSink>, SharedHost, SharedBridge) -> StewardResult<Arc<dyn AgentCore>>
        + Send,
>;

/// Line-oriented log sink handed to the agent core
pub trait OutputSink: Send + Sync {
    fn append_line(&self, line: &str);
    fn dispose(&self);
}

/// Output sink that forwards agent log lines to the tracing stream
#[derive(Debug, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn append_line(&self, line: &str) {
        tracing::info!(target: "steward::agent", "{line}");
    }

    fn dispose(&self) {}
}

/// Stand-in agent used when no real agent core is linked in.
///
/// Lets the host run end-to-end (the controller idles on the bridge);
/// every call succeeds without doing anything.
#[derive(Debug, Default)]
pub struct NoopAgent;

#[async_trait]
impl AgentCore for NoopAgent {
    async fn start_new_task(&self, text: &str) -> StewardResult<()> {
        tracing::debug!("noop agent: start_new_task({text:?})");
        Ok(())
    }

    async fn set_custom_instructions(&self, text: &str) -> StewardResult<()> {
        tracing::debug!("noop agent: set_custom_instructions({} bytes)", text.len());
        Ok(())
    }

    async fn cancel_task(&self) -> StewardResult<()> {
        tracing::debug!("noop agent: cancel_task");
        Ok(())
    }
}
