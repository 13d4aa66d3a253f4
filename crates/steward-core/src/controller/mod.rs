//! Task controller
//!
//! Drives one task over the event bridge from the terminal side:
//! renders streamed say turns, dispatches finalized asks to their
//! policy handlers, runs at most one prompt or timed decision at a
//! time, and owns the abort and exit sequencing. The controller never
//! calls into the agent core except to cancel; tasks are started and
//! answered exclusively through bridge control messages.

mod ask;
pub mod prompt;
pub mod stream;

pub use prompt::{Prompter, ScriptedPrompter};
pub use stream::StreamPrinter;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::agent::AgentCore;
use crate::bridge::SharedBridge;
use crate::error::StewardResult;
use crate::history::{HistoryStore, TaskHistoryItem};
use crate::protocol::{
    AgentEvent, ApprovalDecision, AskKind, ControlMessage, SayKind, TurnKind, TurnMessage,
};

use ask::{handler_for, AskAction, AskContext};
use prompt::{resolve_prompt, PromptKind, PromptResolution, PromptSpec};

/// Delays governing automated decisions and teardown
///
/// Defaults match attended operation; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Wait before auto-approving a retry in full-auto mode
    pub auto_retry_delay: Duration,
    /// Silence on the event stream tolerated before aborting
    pub watchdog: Duration,
    /// Drain window between task cancellation and process exit
    pub abort_grace: Duration,
    /// Drain window between full-auto completion and process exit
    pub exit_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            auto_retry_delay: Duration::from_secs(5),
            watchdog: Duration::from_secs(300),
            abort_grace: Duration::from_secs(3),
            exit_grace: Duration::from_secs(1),
        }
    }
}

/// Startup configuration for a controller run
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Task text; when absent the controller prompts for one
    pub task: Option<String>,
    /// Run unattended: never prompt, decide everything by policy
    pub full_auto: bool,
    /// In full-auto mode, approve `use_mcp_server` asks
    pub auto_approve_mcp: bool,
    /// Reopen a matching historical task instead of starting fresh
    pub resume: bool,
    /// Like `resume`, but chain into a fresh task when the reopened
    /// one already completed
    pub resume_or_new: bool,
    pub timings: Timings,
}

/// The exit the run loop settled on; the embedding process decides
/// when to actually terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    pub code: i32,
}

type PromptFuture = Pin<Box<dyn Future<Output = std::io::Result<PromptResolution>> + Send>>;

/// The single in-flight prompt or timed decision
///
/// `version` is the ask counter captured at creation; a resolution
/// whose version no longer matches answers an ask that has since been
/// superseded and is dropped.
struct PendingPrompt {
    version: u64,
    future: PromptFuture,
}

impl PendingPrompt {
    fn ask(version: u64, prompter: Arc<dyn Prompter>, spec: PromptSpec) -> Self {
        Self {
            version,
            future: Box::pin(async move { resolve_prompt(prompter.as_ref(), &spec).await }),
        }
    }

    fn delayed(version: u64, delay: Duration, decision: ApprovalDecision) -> Self {
        Self {
            version,
            future: Box::pin(async move {
                time::sleep(delay).await;
                Ok(PromptResolution::Decision(decision))
            }),
        }
    }
}

/// What one iteration of the run loop observed
enum Step {
    Event(Result<AgentEvent, broadcast::error::RecvError>),
    Prompt(std::io::Result<PromptResolution>),
    ExitDeadline,
    Watchdog,
    AbortRequested,
}

/// The headless task state machine
pub struct TaskController {
    bridge: SharedBridge,
    agent: Arc<dyn AgentCore>,
    prompter: Arc<dyn Prompter>,
    printer: StreamPrinter,
    history: HistoryStore,
    options: ControllerOptions,
    abort_token: CancellationToken,

    task_started: bool,
    aborting: bool,
    /// The controller itself reopened the current task
    auto_resumed: bool,
    auto_resume_armed: bool,
    chain_armed: bool,
    original_task: Option<String>,
    consecutive_errors: u32,
    /// Dispatch dedupe: the `ts` of the last finalized ask handled
    last_ask_ts: Option<i64>,
    /// Render dedupe: the `ts` of the last finalized say rendered
    last_say_ts: Option<i64>,
    /// Bumped whenever a new ask is dispatched or an abort begins
    ask_version: u64,
}

impl TaskController {
    pub fn new(
        bridge: SharedBridge,
        agent: Arc<dyn AgentCore>,
        prompter: Arc<dyn Prompter>,
        printer: StreamPrinter,
        history: HistoryStore,
        options: ControllerOptions,
    ) -> Self {
        Self {
            bridge,
            agent,
            prompter,
            printer,
            history,
            options,
            abort_token: CancellationToken::new(),
            task_started: false,
            aborting: false,
            auto_resumed: false,
            auto_resume_armed: false,
            chain_armed: false,
            original_task: None,
            consecutive_errors: 0,
            last_ask_ts: None,
            last_say_ts: None,
            ask_version: 0,
        }
    }

    /// Token that requests an abort when cancelled; safe to clone into
    /// signal handlers.
    pub fn abort_handle(&self) -> CancellationToken {
        self.abort_token.clone()
    }

    /// Drive the run to its exit.
    ///
    /// Returns the requested exit code; task history is persisted on
    /// the way out.
    pub async fn run(mut self) -> StewardResult<ExitRequest> {
        let mut events = self.bridge.subscribe_events();
        let mut pending: Option<PendingPrompt> = None;
        let mut exit_deadline: Option<(Instant, i32)> = None;
        let timings = self.options.timings;
        let mut watchdog = Instant::now() + timings.watchdog;

        match self.options.task.clone() {
            Some(task) => self.begin_task(task),
            None => {
                pending = Some(PendingPrompt::ask(
                    self.ask_version,
                    Arc::clone(&self.prompter),
                    PromptSpec::new(PromptKind::TaskText, ""),
                ));
            }
        }

        let exit = loop {
            let exit_at = exit_deadline.map(|(at, _)| at);
            let has_pending = pending.is_some();
            let step = tokio::select! {
                event = events.recv() => Step::Event(event),
                resolution = async {
                    let slot = pending.as_mut().expect("guard ensures a pending prompt");
                    slot.future.as_mut().await
                }, if has_pending => Step::Prompt(resolution),
                _ = time::sleep_until(exit_at.unwrap_or(watchdog)), if exit_at.is_some() => {
                    Step::ExitDeadline
                }
                // The inactivity watchdog only guards unattended runs;
                // an interactive user may sit on a prompt indefinitely.
                _ = time::sleep_until(watchdog), if self.options.full_auto => Step::Watchdog,
                _ = self.abort_token.cancelled(), if !self.aborting => Step::AbortRequested,
            };

            match step {
                Step::Event(Ok(event)) => {
                    watchdog = Instant::now() + timings.watchdog;
                    if let Some(action) = self.handle_event(event) {
                        if let Some(exit) = self
                            .apply_action(action, &mut pending, &mut exit_deadline)
                            .await
                        {
                            break exit;
                        }
                    }
                }
                Step::Event(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!("event stream lagged; {skipped} events dropped");
                }
                Step::Event(Err(broadcast::error::RecvError::Closed)) => {
                    tracing::debug!("event stream closed");
                    break ExitRequest {
                        code: if self.aborting { 1 } else { 0 },
                    };
                }
                Step::Prompt(resolution) => {
                    let version = pending
                        .take()
                        .map(|slot| slot.version)
                        .expect("prompt step requires a pending prompt");
                    if version != self.ask_version {
                        tracing::debug!("dropping answer to a superseded ask");
                        continue;
                    }
                    match resolution {
                        Ok(PromptResolution::Decision(decision)) => self.answer(decision),
                        Ok(PromptResolution::TaskText(text)) => self.begin_task(text),
                        Err(e) => {
                            tracing::warn!("prompt input failed ({e}); aborting");
                            if let Some(exit) =
                                self.begin_abort(&mut pending, &mut exit_deadline).await
                            {
                                break exit;
                            }
                        }
                    }
                }
                Step::ExitDeadline => {
                    break ExitRequest {
                        code: exit_deadline.map(|(_, code)| code).unwrap_or(0),
                    };
                }
                Step::Watchdog => {
                    tracing::warn!(
                        "no agent activity for {:?}; aborting",
                        timings.watchdog
                    );
                    if let Some(exit) = self.begin_abort(&mut pending, &mut exit_deadline).await {
                        break exit;
                    }
                }
                Step::AbortRequested => {
                    if let Some(exit) = self.begin_abort(&mut pending, &mut exit_deadline).await {
                        break exit;
                    }
                }
            }
        };

        self.printer.close();
        if let Err(e) = self.history.save() {
            tracing::warn!("could not persist task history: {e}");
        }
        Ok(exit)
    }

    fn handle_event(&mut self, event: AgentEvent) -> Option<AskAction> {
        match event {
            AgentEvent::PartialMessage { message } => self.process_turn(&message),
            // Snapshots carry the whole conversation; only the last
            // entry can be new.
            AgentEvent::State { messages } => {
                let message = messages.into_iter().last()?;
                self.process_turn(&message)
            }
            AgentEvent::Invoke { invocation } => {
                tracing::debug!("agent invocation {invocation:?} ignored in headless mode");
                None
            }
        }
    }

    fn process_turn(&mut self, message: &TurnMessage) -> Option<AskAction> {
        match message.kind {
            TurnKind::Say => {
                if matches!(message.say, Some(SayKind::Text) | Some(SayKind::Reasoning)) {
                    self.consecutive_errors = 0;
                }
                if !message.partial {
                    if self.last_say_ts == Some(message.ts) {
                        return None;
                    }
                    self.last_say_ts = Some(message.ts);
                }
                self.printer.render(message);
                None
            }
            TurnKind::Ask => {
                // Partial asks are still streaming in; the finalized
                // form carries the full payload and is shown by the
                // prompt itself.
                if !message.is_finalized_ask() {
                    return None;
                }
                self.dispatch_ask(message)
            }
        }
    }

    fn dispatch_ask(&mut self, message: &TurnMessage) -> Option<AskAction> {
        if self.last_ask_ts == Some(message.ts) {
            return None;
        }
        self.last_ask_ts = Some(message.ts);
        self.ask_version += 1;

        if self.aborting {
            // The teardown re-asks whether to resume; decline so the
            // agent settles instead of waiting on a dead prompt.
            if message.ask == Some(AskKind::ResumeTask) {
                return Some(AskAction::Decide(ApprovalDecision::No));
            }
            return None;
        }

        let kind = message.ask.clone()?;
        self.printer.close();
        let mut ctx = AskContext {
            full_auto: self.options.full_auto,
            auto_approve_mcp: self.options.auto_approve_mcp,
            auto_resumed: self.auto_resumed,
            original_task: self.original_task.as_deref(),
            consecutive_errors: &mut self.consecutive_errors,
            auto_resume_armed: &mut self.auto_resume_armed,
            chain_armed: &mut self.chain_armed,
            auto_retry_delay: self.options.timings.auto_retry_delay,
            exit_grace: self.options.timings.exit_grace,
        };
        Some(handler_for(&kind).handle(&mut ctx, message))
    }

    async fn apply_action(
        &mut self,
        action: AskAction,
        pending: &mut Option<PendingPrompt>,
        exit_deadline: &mut Option<(Instant, i32)>,
    ) -> Option<ExitRequest> {
        match action {
            AskAction::Decide(decision) => {
                self.answer(decision);
                None
            }
            AskAction::DecideAfter(delay, decision) => {
                *pending = Some(PendingPrompt::delayed(self.ask_version, delay, decision));
                None
            }
            AskAction::Prompt(spec) => {
                *pending = Some(PendingPrompt::ask(
                    self.ask_version,
                    Arc::clone(&self.prompter),
                    spec,
                ));
                None
            }
            AskAction::StartNewTask(text) => {
                self.start_new_task(text);
                None
            }
            AskAction::Abort => self.begin_abort(pending, exit_deadline).await,
            AskAction::Exit(code) => Some(ExitRequest { code }),
            AskAction::ExitAfter(delay, code) => {
                *exit_deadline = Some((Instant::now() + delay, code));
                None
            }
        }
    }

    /// Begin the configured task: reopen a matching historical task
    /// when resume-or-new is on, otherwise start fresh.
    fn begin_task(&mut self, task: String) {
        if self.options.resume || self.options.resume_or_new {
            if let Some(item) = self.history.find_by_task(&task) {
                let id = item.id.clone();
                tracing::info!("resuming task {id}");
                self.task_started = true;
                self.auto_resumed = true;
                self.auto_resume_armed = true;
                // Only resume-or-new chains past an already-completed task.
                self.chain_armed = self.options.resume_or_new;
                self.original_task = Some(task);
                self.bridge
                    .publish_control(ControlMessage::ShowTaskWithId { text: id });
                return;
            }
            tracing::info!("no history entry matches; starting a new task");
        }
        self.start_new_task(task);
    }

    fn start_new_task(&mut self, text: String) {
        self.task_started = true;
        if self.original_task.is_none() {
            self.original_task = Some(text.clone());
        }
        self.history.push(TaskHistoryItem::new(text.clone()));
        self.bridge.publish_control(ControlMessage::NewTask { text });
    }

    fn answer(&mut self, decision: ApprovalDecision) {
        let delivered = self.bridge.publish_control(decision.into_control());
        if delivered == 0 {
            tracing::warn!("ask answered but no control subscriber is listening");
        }
    }

    /// Start the abort sequence: cancel the in-flight task and keep
    /// draining events for a grace window so teardown asks get their
    /// decline. Idempotent; with no task started it exits immediately.
    async fn begin_abort(
        &mut self,
        pending: &mut Option<PendingPrompt>,
        exit_deadline: &mut Option<(Instant, i32)>,
    ) -> Option<ExitRequest> {
        if self.aborting {
            return None;
        }
        if !self.task_started {
            return Some(ExitRequest { code: 0 });
        }
        tracing::info!("aborting in-flight task");
        self.aborting = true;
        self.ask_version += 1;
        *pending = None;
        self.printer.close();
        if let Err(e) = self.agent.cancel_task().await {
            tracing::warn!("task cancellation failed: {e}");
        }
        *exit_deadline = Some((Instant::now() + self.options.timings.abort_grace, 1));
        None
    }
}

impl std::fmt::Debug for TaskController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskController")
            .field("task_started", &self.task_started)
            .field("aborting", &self.aborting)
            .field("ask_version", &self.ask_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::shared_bridge;
    use crate::protocol::AskResponse;
    use crate::test_support::{MockAgent, SharedBuffer};
    use tempfile::TempDir;

    fn test_timings() -> Timings {
        Timings {
            auto_retry_delay: Duration::from_millis(5),
            watchdog: Duration::from_secs(60),
            abort_grace: Duration::from_millis(150),
            exit_grace: Duration::from_millis(10),
        }
    }

    fn options(task: &str) -> ControllerOptions {
        ControllerOptions {
            task: Some(task.to_string()),
            full_auto: false,
            auto_approve_mcp: false,
            resume: false,
            resume_or_new: false,
            timings: test_timings(),
        }
    }

    fn full_auto(task: &str) -> ControllerOptions {
        ControllerOptions {
            full_auto: true,
            ..options(task)
        }
    }

    struct Harness {
        bridge: SharedBridge,
        agent: Arc<MockAgent>,
        prompter: Arc<ScriptedPrompter>,
        output: SharedBuffer,
        dir: TempDir,
    }

    impl Harness {
        fn new(answers: &[&str]) -> Self {
            Self {
                bridge: shared_bridge(64),
                agent: Arc::new(MockAgent::default()),
                prompter: Arc::new(ScriptedPrompter::new(answers.iter().copied())),
                output: SharedBuffer::default(),
                dir: TempDir::new().unwrap(),
            }
        }

        fn history_path(&self) -> std::path::PathBuf {
            self.dir.path().join("task_history.json")
        }

        fn controller(&self, options: ControllerOptions) -> TaskController {
            TaskController::new(
                Arc::clone(&self.bridge),
                self.agent.clone(),
                self.prompter.clone(),
                StreamPrinter::new(Box::new(self.output.clone())),
                HistoryStore::load(self.history_path()),
                options,
            )
        }

        async fn wait_for_subscriber(&self) {
            wait_until(|| self.bridge.event_subscriber_count() > 0, "subscriber").await;
        }

        fn say(&self, ts: i64, kind: SayKind, text: &str, partial: bool) {
            self.bridge.publish_event(AgentEvent::PartialMessage {
                message: TurnMessage::say(ts, kind, text, partial),
            });
        }

        fn ask(&self, ts: i64, kind: AskKind, text: &str) {
            self.bridge.publish_event(AgentEvent::PartialMessage {
                message: TurnMessage::ask(ts, kind, text, false),
            });
        }

        /// An unrecognized ask-kind is treated as completion and ends
        /// the run with exit code 0.
        fn finish(&self, ts: i64) {
            self.ask(ts, AskKind::Other("session_end".into()), "");
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            time::sleep(Duration::from_millis(2)).await;
        }
        panic!("timed out waiting for {what}");
    }

    async fn recv_control(rx: &mut broadcast::Receiver<ControlMessage>) -> ControlMessage {
        time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a control message")
            .expect("control channel closed")
    }

    fn assert_ask_response(message: ControlMessage, expected: AskResponse) {
        match message {
            ControlMessage::AskResponse { response, .. } => assert_eq!(response, expected),
            other => panic!("unexpected control: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_task_is_published_and_recorded() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(options("build the parser")).run());
        h.wait_for_subscriber().await;

        match recv_control(&mut controls).await {
            ControlMessage::NewTask { text } => assert_eq!(text, "build the parser"),
            other => panic!("unexpected control: {other:?}"),
        }

        h.finish(99);
        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 0);

        let history = HistoryStore::load(h.history_path());
        assert_eq!(history.items().len(), 1);
        assert_eq!(history.items()[0].task, "build the parser");
    }

    #[tokio::test]
    async fn test_prompts_for_task_when_none_given() {
        let h = Harness::new(&["fix the flaky test"]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                task: None,
                ..options("")
            })
            .run(),
        );
        h.wait_for_subscriber().await;

        match recv_control(&mut controls).await {
            ControlMessage::NewTask { text } => assert_eq!(text, "fix the flaky test"),
            other => panic!("unexpected control: {other:?}"),
        }

        h.finish(1);
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_full_auto_completion_exits_zero() {
        let h = Harness::new(&[]);
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;

        h.ask(1, AskKind::CompletionResult, "all done");
        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 0);
        assert_eq!(h.agent.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_full_auto_denies_command_approval() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        h.ask(1, AskKind::Command, "rm -rf target");
        match recv_control(&mut controls).await {
            ControlMessage::AskResponse { response, text } => {
                assert_eq!(response, AskResponse::MessageResponse);
                assert_eq!(text.as_deref(), Some(ask::FULL_AUTO_DENIAL));
            }
            other => panic!("unexpected control: {other:?}"),
        }

        h.ask(2, AskKind::CompletionResult, "done");
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_full_auto_followup_never_prompts() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        h.ask(
            1,
            AskKind::Followup,
            r#"{"question":"Which one?","options":["a","b"]}"#,
        );
        match recv_control(&mut controls).await {
            ControlMessage::AskResponse { response, text } => {
                assert_eq!(response, AskResponse::MessageResponse);
                assert_eq!(text.as_deref(), Some(ask::FULL_AUTO_DENIAL));
            }
            other => panic!("unexpected control: {other:?}"),
        }
        assert!(h.prompter.prompts_seen().is_empty());

        h.ask(2, AskKind::CompletionResult, "done");
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_full_auto_retries_then_aborts() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        for ts in [1, 2] {
            h.ask(ts, AskKind::ApiReqFailed, "rate limited");
            assert_ask_response(
                recv_control(&mut controls).await,
                AskResponse::YesButtonClicked,
            );
        }

        // Third consecutive failure aborts instead of retrying.
        h.ask(3, AskKind::ApiReqFailed, "rate limited");
        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 1);
        assert_eq!(h.agent.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_say_text_resets_error_count() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        for ts in [1, 2] {
            h.ask(ts, AskKind::ApiReqFailed, "hiccup");
            assert_ask_response(
                recv_control(&mut controls).await,
                AskResponse::YesButtonClicked,
            );
        }

        // Real progress in between makes the next failures non-consecutive.
        h.say(10, SayKind::Text, "making progress", false);

        for ts in [11, 12] {
            h.ask(ts, AskKind::ApiReqFailed, "hiccup");
            assert_ask_response(
                recv_control(&mut controls).await,
                AskResponse::YesButtonClicked,
            );
        }

        h.ask(20, AskKind::CompletionResult, "done");
        assert_eq!(run.await.unwrap().unwrap().code, 0);
        assert_eq!(h.agent.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ask_ts_answered_once() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(full_auto("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        // The same finalized ask arrives twice (partial stream plus
        // state snapshot); only one answer may go out.
        h.ask(7, AskKind::Command, "ls");
        h.ask(7, AskKind::Command, "ls");
        assert_ask_response(
            recv_control(&mut controls).await,
            AskResponse::MessageResponse,
        );

        h.ask(8, AskKind::CompletionResult, "done");
        assert_eq!(run.await.unwrap().unwrap().code, 0);
        assert!(controls.try_recv().is_err(), "duplicate ask was answered twice");
    }

    #[tokio::test]
    async fn test_interactive_followup_answered_by_index() {
        let h = Harness::new(&["2"]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(options("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        h.ask(
            1,
            AskKind::Followup,
            r#"{"question":"Which database?","options":["sqlite","postgres"]}"#,
        );
        match recv_control(&mut controls).await {
            ControlMessage::AskResponse { response, text } => {
                assert_eq!(response, AskResponse::MessageResponse);
                assert_eq!(text.as_deref(), Some("postgres"));
            }
            other => panic!("unexpected control: {other:?}"),
        }

        h.finish(2);
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_new_ask_supersedes_pending_prompt() {
        // The prompter never answers, so the first ask's prompt stays
        // open until the next ask replaces it.
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(h.controller(options("build X")).run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        h.ask(1, AskKind::Command, "ls");
        wait_until(|| h.prompter.prompts_seen().len() == 1, "prompt shown").await;

        h.finish(2);
        assert_eq!(run.await.unwrap().unwrap().code, 0);
        assert!(
            controls.try_recv().is_err(),
            "superseded ask must not be answered"
        );
    }

    #[tokio::test]
    async fn test_abort_before_task_exits_zero() {
        let h = Harness::new(&[]);
        let controller = h.controller(ControllerOptions {
            task: None,
            ..options("")
        });
        let abort = controller.abort_handle();
        let run = tokio::spawn(controller.run());
        h.wait_for_subscriber().await;

        abort.cancel();
        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 0);
        assert_eq!(h.agent.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_abort_cancels_task_and_declines_teardown_resume() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let controller = h.controller(options("build X"));
        let abort = controller.abort_handle();
        let run = tokio::spawn(controller.run());
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // newTask

        abort.cancel();
        wait_until(|| h.agent.cancel_count() == 1, "cancel_task").await;

        // The agent tears down by asking to resume; the controller
        // declines so it can settle before the grace window closes.
        h.ask(5, AskKind::ResumeTask, "");
        assert_ask_response(
            recv_control(&mut controls).await,
            AskResponse::NoButtonClicked,
        );

        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 1);
    }

    #[tokio::test]
    async fn test_resume_or_new_reopens_matching_task() {
        let h = Harness::new(&[]);
        std::fs::write(
            h.history_path(),
            r#"[{"id":"tid-1","task":"build X","ts":5}]"#,
        )
        .unwrap();
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                resume_or_new: true,
                ..options("build X")
            })
            .run(),
        );
        h.wait_for_subscriber().await;

        match recv_control(&mut controls).await {
            ControlMessage::ShowTaskWithId { text } => assert_eq!(text, "tid-1"),
            other => panic!("unexpected control: {other:?}"),
        }

        // The reopened task asks to resume; approved without a prompt.
        h.ask(1, AskKind::ResumeTask, "");
        assert_ask_response(
            recv_control(&mut controls).await,
            AskResponse::YesButtonClicked,
        );
        assert!(h.prompter.prompts_seen().is_empty());
        assert!(h.agent.started().is_empty());

        h.finish(2);
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_resume_of_completed_task_chains_new_task() {
        let h = Harness::new(&[]);
        std::fs::write(
            h.history_path(),
            r#"[{"id":"tid-1","task":"build X","ts":5}]"#,
        )
        .unwrap();
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                resume_or_new: true,
                ..options("build X")
            })
            .run(),
        );
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // showTaskWithId

        // The reopened task already finished; chain into a fresh run
        // of the same task text.
        h.ask(1, AskKind::ResumeCompletedTask, "");
        match recv_control(&mut controls).await {
            ControlMessage::NewTask { text } => assert_eq!(text, "build X"),
            other => panic!("unexpected control: {other:?}"),
        }

        h.finish(2);
        assert_eq!(run.await.unwrap().unwrap().code, 0);

        let history = HistoryStore::load(h.history_path());
        assert_eq!(history.items().len(), 2);
    }

    #[tokio::test]
    async fn test_plain_resume_does_not_chain_on_completion() {
        let h = Harness::new(&[]);
        std::fs::write(
            h.history_path(),
            r#"[{"id":"tid-1","task":"build X","ts":5}]"#,
        )
        .unwrap();
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                resume: true,
                full_auto: true,
                ..options("build X")
            })
            .run(),
        );
        h.wait_for_subscriber().await;
        recv_control(&mut controls).await; // showTaskWithId

        // Completion simply ends the run instead of starting over.
        h.ask(1, AskKind::ResumeCompletedTask, "");
        assert_eq!(run.await.unwrap().unwrap().code, 0);
        assert!(controls.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resume_or_new_without_match_starts_fresh() {
        let h = Harness::new(&[]);
        let mut controls = h.bridge.subscribe_controls();
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                resume_or_new: true,
                ..options("brand new task")
            })
            .run(),
        );
        h.wait_for_subscriber().await;

        assert!(matches!(
            recv_control(&mut controls).await,
            ControlMessage::NewTask { .. }
        ));

        h.finish(1);
        assert_eq!(run.await.unwrap().unwrap().code, 0);
    }

    #[tokio::test]
    async fn test_watchdog_aborts_stalled_full_auto_run() {
        let h = Harness::new(&[]);
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                timings: Timings {
                    watchdog: Duration::from_millis(50),
                    abort_grace: Duration::from_millis(20),
                    ..test_timings()
                },
                ..full_auto("build X")
            })
            .run(),
        );
        h.wait_for_subscriber().await;

        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 1);
        assert_eq!(h.agent.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_interactive_run_survives_silence() {
        // A quiet agent (or a pondering user) must not trip the
        // watchdog outside full-auto mode.
        let h = Harness::new(&[]);
        let run = tokio::spawn(
            h.controller(ControllerOptions {
                timings: Timings {
                    watchdog: Duration::from_millis(50),
                    ..test_timings()
                },
                ..options("build X")
            })
            .run(),
        );
        h.wait_for_subscriber().await;

        time::sleep(Duration::from_millis(150)).await;
        h.finish(1);
        let exit = run.await.unwrap().unwrap();
        assert_eq!(exit.code, 0);
        assert_eq!(h.agent.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_streamed_say_is_rendered() {
        let h = Harness::new(&[]);
        let run = tokio::spawn(h.controller(options("build X")).run());
        h.wait_for_subscriber().await;

        h.say(1, SayKind::Text, "hel", true);
        h.say(1, SayKind::Text, "hello wo", true);
        h.say(1, SayKind::Text, "hello world", false);
        h.finish(2);
        assert_eq!(run.await.unwrap().unwrap().code, 0);

        assert!(h
            .output
            .contents()
            .contains("type: say\nkind: text\ntext:\nhello world\n"));
    }
}
