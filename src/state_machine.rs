//! Core session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{
    ExitMatch, ExitPolicy, Identity, IdentityParseError, Phase, SessionContext, SessionProfile,
    Speaker, TerminationReason, Transcript, Turn,
};
pub use transition::{transition, TransitionError, TransitionResult};
