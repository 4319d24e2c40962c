//! checkup-bot: conversational health intake over websockets
//!
//! Each websocket connection runs a short interview driven by a hosted
//! language model, then summarizes the conversation, stores the report, and
//! alerts a doctor when the symptoms are severe.

mod api;
mod config;
mod db;
mod llm;
mod notify;
mod prompts;
mod report;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use runtime::{DatabaseRecorder, LlmResponder, LlmSummarizer, SessionServices};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkup_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let llm = llm::connect(&config.llm)?;
    let temperature = Some(config.llm.temperature);

    let services = SessionServices {
        responder: Arc::new(LlmResponder::new(llm.clone(), config.exit.token(), temperature)),
        summarizer: Arc::new(LlmSummarizer::new(llm, temperature)),
        recorder: Arc::new(DatabaseRecorder::new(db.clone())),
        notifier: notify::build(&config.notifier, config.timeouts.notifier)?,
        timeouts: config.timeouts,
    };

    let state = AppState::new(services, config.exit.clone(), db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "checkup-bot listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
