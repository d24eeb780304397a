//! Scripted in-memory completion service for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ChatMessage, CompletionOutput, CompletionService, LlmError, ResponseMode};

/// One recorded call: the messages sent and the mode label.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub mode: &'static str,
}

/// Replays scripted results in order. Once the script runs out it keeps
/// returning `repeat` (if set) or `EmptyContent`.
#[derive(Default)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<CompletionOutput, LlmError>>>,
    repeat: Option<CompletionOutput>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<CompletionOutput, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn always(output: CompletionOutput) -> Self {
        Self {
            repeat: Some(output),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        mode: &ResponseMode,
    ) -> Result<CompletionOutput, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            mode: mode.label(),
        });

        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => self.repeat.clone().ok_or(LlmError::EmptyContent),
        }
    }
}

/// A well-formed tailoring payload with three sections.
pub fn valid_tailor_json() -> Value {
    json!({
        "summary": "Engineering leader who grew and managed a team of 5 engineers.",
        "improved_resume": "Reframed management scope and added team outcomes.",
        "cover_letter": "Dear Hiring Manager,\n\nI am excited to apply...\n\nSincerely,\nJane",
        "sections": [
            {"heading": "Leadership", "bullets": ["Managed a team of 5 engineers", "Ran weekly 1:1s"]},
            {"heading": "Delivery", "bullets": ["Shipped 3 releases per quarter", "Cut incident count 40%"]},
            {"heading": "Hiring", "bullets": ["Hired 2 engineers", "Built an onboarding plan"]}
        ]
    })
}
