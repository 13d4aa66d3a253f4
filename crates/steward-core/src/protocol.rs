//! Wire types for the agent turn-taking protocol
//!
//! Everything the agent core and the task controller exchange travels
//! through the event bridge as one of these types. Serialization matches
//! the vocabulary of the original UI-oriented protocol (`camelCase`
//! message tags, `snake_case` ask/say kinds), so recorded transcripts
//! stay interchangeable with the graphical host.

use serde::{Deserialize, Serialize};

/// Event published by the agent core toward the (headless) UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AgentEvent {
    /// Full snapshot of the conversation; the last entry is the current message
    State { messages: Vec<TurnMessage> },
    /// Incremental update to a single in-flight message
    PartialMessage { message: TurnMessage },
    /// The agent requests an action from the host (e.g. `sendTask`)
    Invoke { invocation: String },
}

/// Message published by the controller toward the agent core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    /// Answer to an outstanding ask
    #[serde(rename_all = "camelCase")]
    AskResponse {
        response: AskResponse,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// Start a brand new task with the given text
    NewTask { text: String },
    /// Re-open an existing task; `text` carries the task id
    ShowTaskWithId { text: String },
}

/// The three wire-level answers an ask can receive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AskResponse {
    YesButtonClicked,
    NoButtonClicked,
    MessageResponse,
}

/// A single conversation turn, streamed or final
///
/// For a fixed `ts`, zero or more `partial = true` records precede
/// exactly one `partial = false` finalization; `ts` identifies the
/// message currently in flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnMessage {
    /// Millisecond timestamp; identity of the in-flight message
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: TurnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<AskKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub say: Option<SayKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub partial: bool,
}

impl TurnMessage {
    /// Build a say turn
    pub fn say(ts: i64, kind: SayKind, text: impl Into<String>, partial: bool) -> Self {
        Self {
            ts,
            kind: TurnKind::Say,
            ask: None,
            say: Some(kind),
            text: Some(text.into()),
            partial,
        }
    }

    /// Build an ask turn
    pub fn ask(ts: i64, kind: AskKind, text: impl Into<String>, partial: bool) -> Self {
        Self {
            ts,
            kind: TurnKind::Ask,
            ask: Some(kind),
            say: None,
            text: Some(text.into()),
            partial,
        }
    }

    /// Whether this turn is a finalized ask awaiting an answer
    pub fn is_finalized_ask(&self) -> bool {
        self.kind == TurnKind::Ask && !self.partial
    }

    /// The turn text, empty when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Name of the ask or say kind for rendering
    pub fn kind_label(&self) -> String {
        match self.kind {
            TurnKind::Ask => self
                .ask
                .as_ref()
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            TurnKind::Say => self
                .say
                .as_ref()
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Render the terminal header for this turn:
    /// `type: <ask|say>` / `kind: <value>` / `text:`
    pub fn header(&self) -> String {
        let turn_type = match self.kind {
            TurnKind::Ask => "ask",
            TurnKind::Say => "say",
        };
        format!("type: {}\nkind: {}\ntext:\n", turn_type, self.kind_label())
    }

    /// Whether a `tool` ask payload denotes task completion
    ///
    /// The agent wraps tool approval requests in a JSON object whose
    /// `tool` field names the tool being invoked.
    pub fn denotes_completion_tool(&self) -> bool {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(self.text()) else {
            return false;
        };
        matches!(
            value.get("tool").and_then(|t| t.as_str()),
            Some("attempt_completion") | Some("attemptCompletion")
        )
    }
}

/// Whether a turn is informational or a request for approval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Ask,
    Say,
}

/// Ask kinds the agent may emit
///
/// Unrecognized kinds deserialize into `Other` rather than failing;
/// the controller treats them as task completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum AskKind {
    Followup,
    Command,
    CommandOutput,
    Tool,
    ApiReqFailed,
    CompletionResult,
    ResumeTask,
    ResumeCompletedTask,
    MistakeLimitReached,
    BrowserActionLaunch,
    UseMcpServer,
    AutoApprovalMaxReqReached,
    Other(String),
}

impl AskKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Followup => "followup",
            Self::Command => "command",
            Self::CommandOutput => "command_output",
            Self::Tool => "tool",
            Self::ApiReqFailed => "api_req_failed",
            Self::CompletionResult => "completion_result",
            Self::ResumeTask => "resume_task",
            Self::ResumeCompletedTask => "resume_completed_task",
            Self::MistakeLimitReached => "mistake_limit_reached",
            Self::BrowserActionLaunch => "browser_action_launch",
            Self::UseMcpServer => "use_mcp_server",
            Self::AutoApprovalMaxReqReached => "auto_approval_max_req_reached",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for AskKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "followup" => Self::Followup,
            "command" => Self::Command,
            "command_output" => Self::CommandOutput,
            "tool" => Self::Tool,
            "api_req_failed" => Self::ApiReqFailed,
            "completion_result" => Self::CompletionResult,
            "resume_task" => Self::ResumeTask,
            "resume_completed_task" => Self::ResumeCompletedTask,
            "mistake_limit_reached" => Self::MistakeLimitReached,
            "browser_action_launch" => Self::BrowserActionLaunch,
            "use_mcp_server" => Self::UseMcpServer,
            "auto_approval_max_req_reached" => Self::AutoApprovalMaxReqReached,
            _ => Self::Other(value),
        }
    }
}

impl From<AskKind> for String {
    fn from(value: AskKind) -> Self {
        value.as_str().to_string()
    }
}

/// Say kinds the agent may emit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum SayKind {
    Task,
    Text,
    Reasoning,
    Error,
    CommandOutput,
    CompletionResult,
    ApiReqStarted,
    Tool,
    Other(String),
}

impl SayKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Task => "task",
            Self::Text => "text",
            Self::Reasoning => "reasoning",
            Self::Error => "error",
            Self::CommandOutput => "command_output",
            Self::CompletionResult => "completion_result",
            Self::ApiReqStarted => "api_req_started",
            Self::Tool => "tool",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for SayKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "task" => Self::Task,
            "text" => Self::Text,
            "reasoning" => Self::Reasoning,
            "error" => Self::Error,
            "command_output" => Self::CommandOutput,
            "completion_result" => Self::CompletionResult,
            "api_req_started" => Self::ApiReqStarted,
            "tool" => Self::Tool,
            _ => Self::Other(value),
        }
    }
}

impl From<SayKind> for String {
    fn from(value: SayKind) -> Self {
        value.as_str().to_string()
    }
}

/// A followup ask decoded from its JSON payload
///
/// Malformed payloads degrade to the raw text with no options.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FollowupQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FollowupQuestion {
    /// Parse a followup payload, falling back to the raw text
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_else(|_| Self {
            question: text.to_string(),
            options: Vec::new(),
        })
    }
}

/// The decision produced by an approval handler, keyed to the ask-kind
/// that produced it by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Yes,
    No,
    Text(String),
}

impl ApprovalDecision {
    /// Render the decision as the ask-response control message
    pub fn into_control(self) -> ControlMessage {
        match self {
            Self::Yes => ControlMessage::AskResponse {
                response: AskResponse::YesButtonClicked,
                text: None,
            },
            Self::No => ControlMessage::AskResponse {
                response: AskResponse::NoButtonClicked,
                text: None,
            },
            Self::Text(text) => ControlMessage::AskResponse {
                response: AskResponse::MessageResponse,
                text: Some(text),
            },
        }
    }
}
