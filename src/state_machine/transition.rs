//! Pure state transition function
//!
//! Given the same phase, context and event this always produces the same
//! outcome; all I/O is described by the returned effects.

use super::state::{
    Identity, Phase, SessionContext, TerminationReason, INVALID_IDENTITY_MESSAGE,
    START_CONVERSATION_SEED,
};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Phase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Phase) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session already terminated ({0})")]
    AlreadyTerminated(TerminationReason),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

fn terminate(reason: TerminationReason) -> TransitionResult {
    TransitionResult::new(Phase::Terminated { reason }).with_effect(Effect::Conclude { reason })
}

/// Pure transition function
pub fn transition(
    state: &Phase,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Terminated sessions accept nothing
        // ============================================================
        (Phase::Terminated { reason }, _) => Err(TransitionError::AlreadyTerminated(*reason)),

        // ============================================================
        // Connection accepted
        // ============================================================
        (phase, Event::Connected) => {
            let result = TransitionResult::new(*phase);
            Ok(match &context.profile.greeting {
                Some(greeting) => result.with_effect(Effect::send(greeting.clone())),
                None => result,
            })
        }

        // ============================================================
        // Identity collection
        // ============================================================
        (Phase::AwaitingIdentity, Event::Frame { text }) => match Identity::parse(&text) {
            Ok(identity) => {
                let narration = identity.narration();
                Ok(TransitionResult::new(Phase::Interviewing).with_effects([
                    Effect::AdoptIdentity { identity },
                    Effect::append_user(narration),
                    Effect::request_seeded_reply(START_CONVERSATION_SEED),
                ]))
            }
            Err(e) => {
                tracing::debug!(
                    session_id = %context.session_id,
                    error = %e,
                    "Rejected identity frame"
                );
                Ok(TransitionResult::new(Phase::AwaitingIdentity)
                    .with_effect(Effect::send(INVALID_IDENTITY_MESSAGE)))
            }
        },

        // ============================================================
        // Interview loop
        // ============================================================
        (Phase::Interviewing, Event::Frame { text }) => {
            if text.trim().is_empty() {
                return Ok(TransitionResult::new(Phase::Interviewing));
            }
            if context.exit.user_requested(&text) {
                return Ok(terminate(TerminationReason::UserRequestedExit));
            }
            Ok(TransitionResult::new(Phase::Interviewing)
                .with_effect(Effect::append_user(text))
                .with_effect(Effect::request_reply()))
        }

        (Phase::Interviewing, Event::ResponderReply { text }) => {
            let model_exit = context.exit.model_requested(&text);
            let result = TransitionResult::new(Phase::Interviewing).with_effects([
                Effect::append_bot(text.clone()),
                Effect::send(text),
            ]);
            if model_exit {
                let ended = terminate(TerminationReason::ModelRequestedExit);
                Ok(TransitionResult::new(ended.new_state)
                    .with_effects(result.effects)
                    .with_effects(ended.effects))
            } else {
                Ok(result)
            }
        }

        // ============================================================
        // Failures and disconnects
        // ============================================================
        (Phase::AwaitingIdentity | Phase::Interviewing, Event::ResponderFailed { error }) => {
            tracing::warn!(
                session_id = %context.session_id,
                error = %error,
                "Responder failed, ending session"
            );
            Ok(terminate(TerminationReason::ConnectionError))
        }

        (Phase::AwaitingIdentity | Phase::Interviewing, Event::TransportFailed { .. }) => {
            Ok(terminate(TerminationReason::ConnectionError))
        }

        (Phase::AwaitingIdentity | Phase::Interviewing, Event::Disconnected) => {
            Ok(terminate(TerminationReason::ConnectionClosed))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {}",
            event.kind()
        ))),
    }
}
