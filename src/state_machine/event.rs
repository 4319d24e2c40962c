//! Events that can occur in a session

use crate::llm::LlmError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Transport events
    /// The connection was accepted
    Connected,
    /// A text frame arrived from the client
    Frame { text: String },
    /// The client went away
    Disconnected,
    /// Reading from the connection failed
    TransportFailed { message: String },

    // Responder events
    ResponderReply { text: String },
    ResponderFailed { error: LlmError },
}

impl Event {
    pub fn frame(text: impl Into<String>) -> Self {
        Event::Frame { text: text.into() }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Event::ResponderReply { text: text.into() }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Connected => "connected",
            Event::Frame { .. } => "frame",
            Event::Disconnected => "disconnected",
            Event::TransportFailed { .. } => "transport_failed",
            Event::ResponderReply { .. } => "responder_reply",
            Event::ResponderFailed { .. } => "responder_failed",
        }
    }
}
