//! Session runtime executor

use super::traits::{Notifier, Recorder, Responder, Summarizer, Transport};
use super::SessionServices;

use crate::llm::LlmError;
use crate::report::{escalation_message, requires_alert, StructuredSummary, SummaryRecord};
use crate::state_machine::state::{CLOSING_NOTICE, EXIT_ACKNOWLEDGMENT};
use crate::state_machine::{
    transition, Effect, Event, Identity, Phase, SessionContext, TerminationReason, Transcript,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: TerminationReason,
    pub turns: usize,
}

/// Drives one connection from accept to close
pub struct SessionRuntime<T: Transport> {
    context: SessionContext,
    state: Phase,
    identity: Option<Identity>,
    transcript: Transcript,
    services: SessionServices,
    transport: T,
    /// Cleared once a send or receive fails
    writable: bool,
    concluded: bool,
    alerts: Vec<JoinHandle<()>>,
}

impl<T: Transport> SessionRuntime<T> {
    pub fn new(context: SessionContext, services: SessionServices, transport: T) -> Self {
        let state = Phase::initial(&context.profile);
        Self {
            context,
            state,
            identity: None,
            transcript: Transcript::new(),
            services,
            transport,
            writable: true,
            concluded: false,
            alerts: Vec::new(),
        }
    }

    pub async fn run(mut self) -> SessionOutcome {
        tracing::info!(
            session_id = %self.context.session_id,
            profile = self.context.profile.name,
            "Starting session"
        );

        self.process_event(Event::Connected).await;

        while !self.state.is_terminal() {
            let event = match self.transport.receive().await {
                Some(Ok(text)) => Event::Frame { text },
                Some(Err(e)) => {
                    self.writable = false;
                    Event::TransportFailed {
                        message: e.to_string(),
                    }
                }
                None => {
                    self.writable = false;
                    Event::Disconnected
                }
            };
            self.process_event(event).await;
        }

        // Alert tasks carry their own timeout
        for handle in std::mem::take(&mut self.alerts) {
            if let Err(e) = handle.await {
                tracing::error!(session_id = %self.context.session_id, error = %e, "Alert task panicked");
            }
        }

        let reason = self
            .state
            .terminated_reason()
            .unwrap_or(TerminationReason::ConnectionError);
        tracing::info!(
            session_id = %self.context.session_id,
            reason = %reason,
            turns = self.transcript.len(),
            "Session ended"
        );

        SessionOutcome {
            reason,
            turns: self.transcript.len(),
        }
    }

    async fn process_event(&mut self, event: Event) {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let kind = current_event.kind();
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(
                        session_id = %self.context.session_id,
                        event = kind,
                        error = %e,
                        "Event dropped"
                    );
                    continue;
                }
            };

            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Send { text } => self.send(&text).await.err().map(|message| {
                Event::TransportFailed { message }
            }),

            Effect::AdoptIdentity { identity } => {
                if self.identity.is_none() {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        username = %identity.username,
                        "Identity accepted"
                    );
                    self.identity = Some(identity);
                }
                None
            }

            Effect::AppendTurn { turn } => {
                self.transcript.push(turn);
                None
            }

            Effect::RequestReply { instruction } => {
                Some(self.request_reply(instruction.as_deref()).await)
            }

            Effect::Conclude { reason } => {
                self.conclude(reason).await;
                None
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), String> {
        if !self.writable {
            return Err("connection is no longer writable".to_string());
        }
        if let Err(e) = self.transport.send(text).await {
            tracing::warn!(session_id = %self.context.session_id, error = %e, "Send failed");
            self.writable = false;
            return Err(e.to_string());
        }
        Ok(())
    }

    async fn request_reply(&mut self, instruction: Option<&str>) -> Event {
        let limit = self.services.timeouts.responder;
        let reply = tokio::time::timeout(
            limit,
            self.services.responder.respond(&self.transcript, instruction),
        )
        .await;

        match reply {
            Ok(Ok(text)) => Event::ResponderReply { text },
            Ok(Err(error)) => Event::ResponderFailed { error },
            Err(_) => Event::ResponderFailed {
                error: LlmError::timeout(limit),
            },
        }
    }

    /// Terminal burst: summarize, record, escalate, acknowledge, close
    async fn conclude(&mut self, reason: TerminationReason) {
        if self.concluded {
            tracing::warn!(session_id = %self.context.session_id, "Session already concluded");
            return;
        }
        self.concluded = true;

        let reachable = reason.peer_reachable() && self.writable;
        // Error endings only get the closing notice
        let orderly = reachable && reason.is_orderly();
        tracing::info!(
            session_id = %self.context.session_id,
            reason = %reason,
            turns = self.transcript.len(),
            "Concluding session"
        );

        if !self.transcript.is_empty() {
            if let Some(summary_text) = self.summarize().await {
                let username = self.identity.as_ref().map(|id| id.username.as_str());
                let record = SummaryRecord::from_summary(&summary_text, username);

                if let Err(e) = self
                    .services
                    .recorder
                    .record(&self.context.session_id, &record)
                    .await
                {
                    tracing::error!(session_id = %self.context.session_id, error = %e, "Failed to record summary");
                }

                if self.context.profile.echo_summary && orderly {
                    let _ = self.send(&summary_text).await;
                }

                if self.context.profile.escalate {
                    if let Some(summary) = record.structured() {
                        let severity = summary.severity();
                        if requires_alert(severity) {
                            self.dispatch_alert(summary.clone());
                        }
                        if orderly {
                            let _ = self.send(escalation_message(severity)).await;
                        }
                    }
                }
            }
        }

        if reachable {
            let farewell = if orderly {
                EXIT_ACKNOWLEDGMENT
            } else {
                CLOSING_NOTICE
            };
            if self.send(farewell).await.is_ok() {
                if let Err(e) = self.transport.close().await {
                    tracing::debug!(session_id = %self.context.session_id, error = %e, "Close failed");
                }
            }
        }
    }

    async fn summarize(&mut self) -> Option<String> {
        let limit = self.services.timeouts.summarizer;
        match tokio::time::timeout(limit, self.services.summarizer.summarize(&self.transcript))
            .await
        {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                tracing::error!(session_id = %self.context.session_id, error = %e, "Summarizer failed");
                None
            }
            Err(_) => {
                tracing::error!(
                    session_id = %self.context.session_id,
                    timeout_secs = limit.as_secs(),
                    "Summarizer timed out"
                );
                None
            }
        }
    }

    fn dispatch_alert(&mut self, summary: StructuredSummary) {
        let notifier: Arc<dyn Notifier> = Arc::clone(&self.services.notifier);
        let limit = self.services.timeouts.notifier;
        let session_id = self.context.session_id.clone();

        self.alerts.push(tokio::spawn(async move {
            let channel = notifier.channel();
            match tokio::time::timeout(limit, notifier.notify(&summary)).await {
                Ok(Ok(())) => tracing::info!(session_id = %session_id, channel, "Doctor alert sent"),
                Ok(Err(e)) => {
                    tracing::error!(session_id = %session_id, channel, error = %e, "Doctor alert failed");
                }
                Err(_) => tracing::error!(session_id = %session_id, channel, "Doctor alert timed out"),
            }
        }));
    }
}
