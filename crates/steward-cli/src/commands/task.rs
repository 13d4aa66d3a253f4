//! The `task` command: run one task to completion.
//!
//! Wires the host shim, the bridge, the agent core, and the task
//! controller together, then hands the requested exit code back to
//! `main` for the actual `process::exit`.

use std::sync::Arc;

use steward_core::agent::{AgentCore, AgentFactory, NoopAgent, TracingSink};
use steward_core::bridge::shared_bridge;
use steward_core::controller::{
    ControllerOptions, ExitRequest, StreamPrinter, TaskController, Timings,
};
use steward_core::error::{StewardError, StewardResult};
use steward_core::history::{HistoryStore, HISTORY_FILE};
use steward_core::host::HostContext;
use steward_core::settings::{SettingsFile, SETTINGS_FILE};

use crate::args::TaskArgs;
use crate::console::{CLIConsole, TerminalPrompter};
use crate::signal_handler::SignalHandler;

/// Build the agent core for this run.
///
/// The default factory yields the no-op stand-in; embeddings that link
/// in a real agent replace this.
fn default_agent_factory() -> AgentFactory {
    Box::new(|_sink, _host, _bridge| Ok(Arc::new(NoopAgent) as Arc<dyn AgentCore>))
}

pub async fn execute(args: TaskArgs, console: &CLIConsole) -> StewardResult<ExitRequest> {
    let storage = super::resolve_storage(args.storage)?;
    let workspace = match args.workspace {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| StewardError::config(format!("cannot determine working directory: {e}")))?,
    };
    console.info(&format!("workspace: {}", workspace.display()));

    let host = Arc::new(HostContext::new(&workspace));
    let settings_path = args
        .settings_file
        .unwrap_or_else(|| storage.join(SETTINGS_FILE));
    SettingsFile::load(&settings_path).apply(&host);

    for path in &args.visible_files {
        if let Err(e) = host.window.show_document(path.clone()) {
            console.warn(&format!("cannot open {}: {e}", path.display()));
        }
    }

    let bridge = shared_bridge(256);
    let agent = default_agent_factory()(
        Arc::new(TracingSink),
        Arc::clone(&host),
        Arc::clone(&bridge),
    )?;

    if let Some(text) = args.custom_instructions {
        agent.set_custom_instructions(&text).await?;
    }

    let history = HistoryStore::load(storage.join(HISTORY_FILE));
    let options = ControllerOptions {
        task: args.task,
        full_auto: args.full_auto,
        auto_approve_mcp: args.auto_approve_mcp,
        resume: args.resume,
        resume_or_new: args.resume_or_new,
        timings: Timings::default(),
    };

    let controller = TaskController::new(
        bridge,
        agent,
        Arc::new(TerminalPrompter),
        StreamPrinter::stdout(),
        history,
        options,
    );
    let _signals = SignalHandler::start(controller.abort_handle())
        .map_err(|e| StewardError::Other(format!("cannot install signal handler: {e}")))?;

    controller.run().await
}
