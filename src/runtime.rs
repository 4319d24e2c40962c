//! Runtime for executing sessions
//!
//! One [`SessionRuntime`] runs per connection. The collaborators it talks to
//! are built once in `main` and shared through [`SessionServices`].

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{SessionOutcome, SessionRuntime};
pub use traits::*;

use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_NOTIFIER_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bounds on collaborator calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub responder: Duration,
    pub summarizer: Duration,
    pub notifier: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            responder: DEFAULT_RESPONDER_TIMEOUT,
            summarizer: DEFAULT_SUMMARIZER_TIMEOUT,
            notifier: DEFAULT_NOTIFIER_TIMEOUT,
        }
    }
}

/// Shared handles every session uses
#[derive(Clone)]
pub struct SessionServices {
    pub responder: Arc<dyn Responder>,
    pub summarizer: Arc<dyn Summarizer>,
    pub recorder: Arc<dyn Recorder>,
    pub notifier: Arc<dyn Notifier>,
    pub timeouts: Timeouts,
}
