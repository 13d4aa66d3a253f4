//! Ask dispatch table
//!
//! Each ask-kind maps to one handler object implementing a single small
//! interface, so every policy is unit-testable in isolation and nothing
//! falls through silently. Handlers are pure decision logic: they never
//! touch the bridge or the terminal, they return an [`AskAction`] the
//! controller executes.

use std::time::Duration;

use crate::protocol::{ApprovalDecision, AskKind, FollowupQuestion, TurnMessage};

use super::prompt::{PromptKind, PromptSpec};

/// Consecutive retryable failures tolerated before the run aborts
pub(crate) const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Fixed answer emitted in full-auto mode for asks that need a human
pub(crate) const FULL_AUTO_DENIAL: &str =
    "Steward is running unattended in full-auto mode and cannot respond to this request.";

/// What the controller should do about a dispatched ask
#[derive(Debug, PartialEq)]
pub(crate) enum AskAction {
    /// Answer immediately
    Decide(ApprovalDecision),
    /// Answer after a fixed delay (full-auto retry)
    DecideAfter(Duration, ApprovalDecision),
    /// Put the question to the prompter
    Prompt(PromptSpec),
    /// Chain into a brand new task with the given text
    StartNewTask(String),
    /// Begin the abort sequence
    Abort,
    /// Request immediate process exit with the given code
    Exit(i32),
    /// Request process exit after a grace delay
    ExitAfter(Duration, i32),
}

/// Controller state a handler may read or update
pub(crate) struct AskContext<'a> {
    pub full_auto: bool,
    pub auto_approve_mcp: bool,
    /// The controller itself initiated the resume of this task
    pub auto_resumed: bool,
    /// Task text the run was started with, for resume chaining
    pub original_task: Option<&'a str>,
    pub consecutive_errors: &'a mut u32,
    /// One-shot approval armed for the next `resume_task` ask
    pub auto_resume_armed: &'a mut bool,
    /// One-shot resume-or-new chain into a fresh task
    pub chain_armed: &'a mut bool,
    pub auto_retry_delay: Duration,
    pub exit_grace: Duration,
}

/// One ask-kind's policy
pub(crate) trait AskHandler: Sync {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction;
}

/// The dispatch table: every ask-kind resolves to exactly one handler.
pub(crate) fn handler_for(kind: &AskKind) -> &'static dyn AskHandler {
    match kind {
        AskKind::Followup => &Followup,
        AskKind::ApiReqFailed | AskKind::MistakeLimitReached => &RetryableFailure,
        AskKind::AutoApprovalMaxReqReached => &AutoApprovalLimit,
        AskKind::CommandOutput => &CommandOutput,
        AskKind::ResumeTask => &ResumeTask,
        AskKind::Command | AskKind::BrowserActionLaunch => &StrictApproval,
        AskKind::Tool => &Tool,
        AskKind::UseMcpServer => &McpServer,
        AskKind::CompletionResult | AskKind::ResumeCompletedTask => &Completion,
        AskKind::Other(_) => &Unknown,
    }
}

fn preamble(message: &TurnMessage, body: &str) -> String {
    format!("{}{}", message.header(), body)
}

/// `followup`: question with optional numbered options, answered as
/// free text or by index.
struct Followup;

impl AskHandler for Followup {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        // Questions need a human; unattended runs say so instead of
        // stalling on a prompt nobody will answer.
        if ctx.full_auto {
            return AskAction::Decide(ApprovalDecision::Text(FULL_AUTO_DENIAL.to_string()));
        }
        let question = FollowupQuestion::parse(message.text());
        let text = question.question.clone();
        AskAction::Prompt(PromptSpec::new(
            PromptKind::Followup(question),
            preamble(message, &text),
        ))
    }
}

/// `api_req_failed` / `mistake_limit_reached`: bounded retries.
struct RetryableFailure;

impl AskHandler for RetryableFailure {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        *ctx.consecutive_errors += 1;
        if *ctx.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            return AskAction::Abort;
        }
        if ctx.full_auto {
            return AskAction::DecideAfter(ctx.auto_retry_delay, ApprovalDecision::Yes);
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesOrText,
            preamble(message, message.text()),
        ))
    }
}

/// `auto_approval_max_req_reached`: not retryable unattended.
struct AutoApprovalLimit;

impl AskHandler for AutoApprovalLimit {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if ctx.full_auto {
            return AskAction::Abort;
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesOrText,
            preamble(message, message.text()),
        ))
    }
}

/// `command_output`: proceed or steer with free text; unattended runs
/// always proceed.
struct CommandOutput;

impl AskHandler for CommandOutput {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if ctx.full_auto {
            return AskAction::Decide(ApprovalDecision::Yes);
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesOrText,
            preamble(message, message.text()),
        ))
    }
}

/// `resume_task`: auto-approved once when the controller initiated the
/// resume, otherwise a regular prompt.
struct ResumeTask;

impl AskHandler for ResumeTask {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if *ctx.auto_resume_armed {
            *ctx.auto_resume_armed = false;
            return AskAction::Decide(ApprovalDecision::Yes);
        }
        if ctx.full_auto {
            return AskAction::Decide(ApprovalDecision::Yes);
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesOrText,
            preamble(message, message.text()),
        ))
    }
}

/// `command` / `browser_action_launch`: strict yes/no, never automated.
struct StrictApproval;

impl AskHandler for StrictApproval {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if ctx.full_auto {
            return AskAction::Decide(ApprovalDecision::Text(FULL_AUTO_DENIAL.to_string()));
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesNo,
            preamble(message, message.text()),
        ))
    }
}

/// `tool`: strict yes/no; full-auto approves only completion tools.
struct Tool;

impl AskHandler for Tool {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if ctx.full_auto {
            if message.denotes_completion_tool() {
                return AskAction::Decide(ApprovalDecision::Yes);
            }
            return AskAction::Decide(ApprovalDecision::Text(FULL_AUTO_DENIAL.to_string()));
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesNo,
            preamble(message, message.text()),
        ))
    }
}

/// `use_mcp_server`: strict yes/no; full-auto approves only under the
/// explicit force-approval startup flag.
struct McpServer;

impl AskHandler for McpServer {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        if ctx.full_auto {
            if ctx.auto_approve_mcp {
                return AskAction::Decide(ApprovalDecision::Yes);
            }
            return AskAction::Decide(ApprovalDecision::Text(FULL_AUTO_DENIAL.to_string()));
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesNo,
            preamble(message, message.text()),
        ))
    }
}

/// `completion_result` / `resume_completed_task`.
struct Completion;

impl AskHandler for Completion {
    fn handle(&self, ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        // A controller-initiated resume found the task already complete:
        // chain into a fresh task with the original text, once.
        if ctx.auto_resumed && *ctx.chain_armed {
            *ctx.chain_armed = false;
            if let Some(task) = ctx.original_task {
                return AskAction::StartNewTask(task.to_string());
            }
        }
        if ctx.full_auto {
            return AskAction::ExitAfter(ctx.exit_grace, 0);
        }
        AskAction::Prompt(PromptSpec::new(
            PromptKind::YesOrText,
            format!(
                "{}\nTask completed. Press enter to finish, or describe what to do next.",
                preamble(message, message.text())
            ),
        ))
    }
}

/// Any ask-kind this host does not recognize is treated as completion.
struct Unknown;

impl AskHandler for Unknown {
    fn handle(&self, _ctx: &mut AskContext<'_>, message: &TurnMessage) -> AskAction {
        tracing::debug!("unrecognized ask kind {:?}; exiting", message.ask);
        AskAction::Exit(0)
    }
}
