//! Approval prompts
//!
//! A prompt is an asynchronous operation that resolves later without
//! stalling message delivery; the controller multiplexes at most one of
//! these alongside the bridge stream. The [`Prompter`] seam keeps the
//! controller testable: the terminal implementation lives in the CLI,
//! tests script their answers with [`ScriptedPrompter`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::protocol::{ApprovalDecision, FollowupQuestion};

/// One line of user input, read asynchronously
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Display `prompt` and resolve with one line of input.
    async fn read_line(&self, prompt: &str) -> std::io::Result<String>;
}

/// What a prompt expects from the user
#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    /// Strict approval: `y`/`yes` approves, anything else declines.
    YesNo,
    /// `y`/`yes` (or an empty line) approves; any other input is sent
    /// back as a free-text message response.
    YesOrText,
    /// Numbered options: a valid index maps to the option text, an
    /// out-of-range index re-prompts, anything else is free text.
    Followup(FollowupQuestion),
    /// A non-empty task description, re-prompting on empty input.
    TaskText,
}

/// A fully rendered prompt awaiting resolution
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub kind: PromptKind,
    /// Turn header and body shown above the input line
    pub preamble: String,
}

impl PromptSpec {
    pub fn new(kind: PromptKind, preamble: impl Into<String>) -> Self {
        Self {
            kind,
            preamble: preamble.into(),
        }
    }

    /// The one-line input hint for this prompt kind.
    fn hint(&self) -> &'static str {
        match &self.kind {
            PromptKind::YesNo => "[y/n] ",
            PromptKind::YesOrText => "[y or reply] ",
            PromptKind::Followup(_) => "answer: ",
            PromptKind::TaskText => "task: ",
        }
    }

    /// Render the full prompt text, including followup options.
    fn render(&self) -> String {
        let mut text = String::new();
        if !self.preamble.is_empty() {
            text.push_str(&self.preamble);
            if !self.preamble.ends_with('\n') {
                text.push('\n');
            }
        }
        if let PromptKind::Followup(question) = &self.kind {
            for (index, option) in question.options.iter().enumerate() {
                text.push_str(&format!("  {}. {}\n", index + 1, option));
            }
        }
        text.push_str(self.hint());
        text
    }
}

/// What a resolved prompt produced
#[derive(Debug, Clone, PartialEq)]
pub enum PromptResolution {
    Decision(ApprovalDecision),
    TaskText(String),
}

/// Drive a prompt to resolution, re-prompting where the kind calls for it.
pub async fn resolve_prompt(
    prompter: &dyn Prompter,
    spec: &PromptSpec,
) -> std::io::Result<PromptResolution> {
    let rendered = spec.render();
    loop {
        let input = prompter.read_line(&rendered).await?;
        let input = input.trim();

        match &spec.kind {
            PromptKind::YesNo => {
                let decision = if is_yes(input) {
                    ApprovalDecision::Yes
                } else {
                    ApprovalDecision::No
                };
                return Ok(PromptResolution::Decision(decision));
            }
            PromptKind::YesOrText => {
                let decision = if input.is_empty() || is_yes(input) {
                    ApprovalDecision::Yes
                } else {
                    ApprovalDecision::Text(input.to_string())
                };
                return Ok(PromptResolution::Decision(decision));
            }
            PromptKind::Followup(question) => {
                if let Ok(index) = input.parse::<usize>() {
                    match index
                        .checked_sub(1)
                        .and_then(|i| question.options.get(i))
                    {
                        Some(option) => {
                            return Ok(PromptResolution::Decision(ApprovalDecision::Text(
                                option.clone(),
                            )))
                        }
                        // Out-of-range index: ask again.
                        None => continue,
                    }
                }
                if input.is_empty() {
                    continue;
                }
                return Ok(PromptResolution::Decision(ApprovalDecision::Text(
                    input.to_string(),
                )));
            }
            PromptKind::TaskText => {
                if input.is_empty() {
                    continue;
                }
                return Ok(PromptResolution::TaskText(input.to_string()));
            }
        }
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "y" | "yes")
}

/// Prompter that replays a fixed script of answers.
///
/// Once the script runs dry it stays pending forever, like a user who
/// never types; useful for exercising stale-response suppression.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    prompts_seen: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt text this prompter was shown.
    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts_seen.lock().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn read_line(&self, prompt: &str) -> std::io::Result<String> {
        self.prompts_seen.lock().push(prompt.to_string());
        let next = self.answers.lock().pop_front();
        match next {
            Some(answer) => Ok(answer),
            None => std::future::pending().await,
        }
    }
}
