//! Effects produced by state transitions

use super::state::{Identity, TerminationReason, Turn};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a text frame to the client
    Send { text: String },

    /// Remember who the user is
    AdoptIdentity { identity: Identity },

    /// Append a turn to the transcript
    AppendTurn { turn: Turn },

    /// Ask the responder for the next bot utterance.
    ///
    /// `instruction` is passed after the transcript without being recorded.
    RequestReply { instruction: Option<String> },

    /// Run the terminal burst: summarize, record, escalate, acknowledge, close
    Conclude { reason: TerminationReason },
}

impl Effect {
    pub fn send(text: impl Into<String>) -> Self {
        Effect::Send { text: text.into() }
    }

    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::user(text),
        }
    }

    pub fn append_bot(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::bot(text),
        }
    }

    pub fn request_reply() -> Self {
        Effect::RequestReply { instruction: None }
    }

    pub fn request_seeded_reply(instruction: impl Into<String>) -> Self {
        Effect::RequestReply {
            instruction: Some(instruction.into()),
        }
    }
}
