//! Session state types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Phase
// ============================================================================

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    UserRequestedExit,
    ModelRequestedExit,
    ConnectionClosed,
    ConnectionError,
}

impl TerminationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::UserRequestedExit => "user_requested_exit",
            TerminationReason::ModelRequestedExit => "model_requested_exit",
            TerminationReason::ConnectionClosed => "connection_closed",
            TerminationReason::ConnectionError => "connection_error",
        }
    }

    /// Whether the peer may still be listening when the session ends
    pub fn peer_reachable(self) -> bool {
        !matches!(self, TerminationReason::ConnectionClosed)
    }

    /// Whether the conversation ended on purpose rather than by failure
    pub fn is_orderly(self) -> bool {
        matches!(
            self,
            TerminationReason::UserRequestedExit | TerminationReason::ModelRequestedExit
        )
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session phase. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the identity record (only when the profile collects identity)
    AwaitingIdentity,
    /// Normal question/answer loop
    Interviewing,
    /// Session is over; nothing else is processed
    Terminated { reason: TerminationReason },
}

impl Phase {
    pub fn initial(profile: &SessionProfile) -> Self {
        if profile.collect_identity {
            Phase::AwaitingIdentity
        } else {
            Phase::Interviewing
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminated { .. })
    }

    /// Position in the lifecycle, used to check monotonicity
    pub fn rank(&self) -> u8 {
        match self {
            Phase::AwaitingIdentity => 0,
            Phase::Interviewing => 1,
            Phase::Terminated { .. } => 2,
        }
    }

    pub fn terminated_reason(&self) -> Option<TerminationReason> {
        match self {
            Phase::Terminated { reason } => Some(*reason),
            _ => None,
        }
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Keys the identity record must carry
pub const IDENTITY_FIELDS: [&str; 4] = ["name", "username", "age", "gender"];

/// Who is being interviewed. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub username: String,
    pub age: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("identity is not valid JSON: {0}")]
    Malformed(String),
    #[error("identity must be a JSON object")]
    NotAnObject,
    #[error("identity is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

impl Identity {
    /// Parse the first inbound frame of an identity-collecting session.
    ///
    /// Only presence of the required keys is checked. Extra keys are
    /// tolerated and any value type is accepted.
    pub fn parse(text: &str) -> Result<Self, IdentityParseError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| IdentityParseError::Malformed(e.to_string()))?;

        let Value::Object(map) = value else {
            return Err(IdentityParseError::NotAnObject);
        };

        let missing: Vec<String> = IDENTITY_FIELDS
            .iter()
            .filter(|key| !map.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IdentityParseError::MissingFields(missing));
        }

        let field = |key: &str| map.get(key).map(field_text).unwrap_or_default();
        Ok(Self {
            name: field("name"),
            username: field("username"),
            age: field("age"),
            gender: field("gender"),
        })
    }

    /// Synthetic opening turn describing who the user is
    pub fn narration(&self) -> String {
        format!(
            "User Info: Name={}, Username={}, Age={}, Gender={}",
            self.name, self.username, self.age, self.gender
        )
    }
}

/// Strings verbatim, everything else as compact JSON
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }
}

/// Append-only conversation log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Plain-text rendering in the `Human:`/`AI:` buffer style
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::User => format!("Human: {}", turn.text),
                Speaker::Bot => format!("AI: {}", turn.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Session context (immutable configuration)
// ============================================================================

/// Reply sent when the identity frame cannot be parsed
pub const INVALID_IDENTITY_MESSAGE: &str = "Invalid user info JSON format.";

/// Instruction sent to the responder right after identity is accepted
pub const START_CONVERSATION_SEED: &str = "Start a conversation based on user info";

/// Acknowledgment sent right before an orderly close
pub const EXIT_ACKNOWLEDGMENT: &str = "EXITING.....";

/// Best-effort notice when a session ends on an internal failure
pub const CLOSING_NOTICE: &str = "Sorry, something went wrong on our side. Closing this session.";

/// Greeting for sessions that skip identity collection
pub const ROUTINE_CHECK_WELCOME: &str =
    "Hello! I'm your agent for a routine health checkup. How can I help you today?";

/// How the responder's own reply is compared with the termination token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitMatch {
    /// The trimmed reply equals the token
    #[default]
    Exact,
    /// The reply contains the token anywhere
    Contains,
}

impl std::str::FromStr for ExitMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(ExitMatch::Exact),
            "contains" | "substring" => Ok(ExitMatch::Contains),
            other => Err(format!("unknown exit match policy '{other}'")),
        }
    }
}

/// Termination token rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPolicy {
    token: String,
    pub model_match: ExitMatch,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self::new("EXIT", ExitMatch::default())
    }
}

impl ExitPolicy {
    /// Blank tokens fall back to `EXIT`
    pub fn new(token: &str, model_match: ExitMatch) -> Self {
        let token = token.trim();
        let token = if token.is_empty() { "EXIT" } else { token };
        Self {
            token: token.to_lowercase(),
            model_match,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// User frames end the session when they contain the token, case-insensitively
    pub fn user_requested(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.token)
    }

    /// Responder replies end the session according to `model_match`
    pub fn model_requested(&self, reply: &str) -> bool {
        let reply = reply.trim().to_lowercase();
        match self.model_match {
            ExitMatch::Exact => reply == self.token,
            ExitMatch::Contains => reply.contains(&self.token),
        }
    }
}

/// Behavior that differs between the intake and routine-check endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub name: &'static str,
    /// Require the identity record before interviewing
    pub collect_identity: bool,
    /// Frame sent as soon as the connection is accepted
    pub greeting: Option<String>,
    /// Evaluate severity and notify on severe summaries
    pub escalate: bool,
    /// Forward the raw summary text to the client before closing
    pub echo_summary: bool,
}

impl SessionProfile {
    /// Identity first, then interview; severe summaries are escalated
    pub fn intake() -> Self {
        Self {
            name: "intake",
            collect_identity: true,
            greeting: Some(String::new()),
            escalate: true,
            echo_summary: false,
        }
    }

    /// Anonymous routine checkup; the summary is shown to the client
    pub fn routine_check() -> Self {
        Self {
            name: "routine_check",
            collect_identity: false,
            greeting: Some(ROUTINE_CHECK_WELCOME.to_string()),
            escalate: false,
            echo_summary: true,
        }
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub profile: SessionProfile,
    pub exit: ExitPolicy,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, profile: SessionProfile, exit: ExitPolicy) -> Self {
        Self {
            session_id: session_id.into(),
            profile,
            exit,
        }
    }
}
