//! Context accumulated for the final synthesis call.

use crate::session::{Message, ToolCallRecord};
use crate::tool::entities::PlanStep;

/// One accepted step: the resolved call and the text shown to the
/// synthesis model.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptTurn {
    /// Step with resolved arguments, as dispatched
    pub step: PlanStep,
    /// Output text as it appears in the transcript
    pub output: String,
}

/// Ordered record of a query and its accepted tool calls.
///
/// Grows monotonically; turns are only appended on acceptance.
#[derive(Debug, Clone)]
pub struct Transcript {
    query: String,
    turns: Vec<TranscriptTurn>,
}

impl Transcript {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            turns: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn push(&mut self, step: PlanStep, output: impl Into<String>) {
        self.turns.push(TranscriptTurn {
            step,
            output: output.into(),
        });
    }

    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Message history for the synthesis call.
    ///
    /// The user query comes first, then each accepted call as an assistant
    /// tool-call message paired with a tool message holding its output. The
    /// tool name doubles as the call id.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(1 + self.turns.len() * 2);
        messages.push(Message::user(&self.query));
        for turn in &self.turns {
            messages.push(Message::assistant_tool_call(ToolCallRecord {
                id: turn.step.name.clone(),
                name: turn.step.name.clone(),
                arguments: turn.step.arguments_json(),
            }));
            messages.push(Message::tool(&turn.step.name, &turn.output));
        }
        messages
    }
}
