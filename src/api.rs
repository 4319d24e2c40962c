//! HTTP API for checkup-bot
//!
//! Websocket endpoints for the two session profiles plus a small JSON surface
//! for liveness and stored reports.

mod handlers;
mod types;
mod websocket;

pub use handlers::create_router;

use crate::db::Database;
use crate::runtime::SessionServices;
use crate::state_machine::ExitPolicy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: SessionServices,
    pub exit: ExitPolicy,
    pub db: Database,
}

impl AppState {
    pub fn new(services: SessionServices, exit: ExitPolicy, db: Database) -> Self {
        Self { services, exit, db }
    }
}
