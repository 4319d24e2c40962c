//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::Database;
use crate::llm::{merge_consecutive, LlmError, LlmMessage, LlmRequest, LlmService};
use crate::prompts;
use crate::report::{StructuredSummary, SummaryRecord};
use crate::state_machine::{Speaker, Transcript};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
    #[error("Transport failure: {0}")]
    Io(String),
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Failed to store summary: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Notification request failed: {0}")]
    Request(String),
    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Produces the next interviewer utterance
#[async_trait]
pub trait Responder: Send + Sync {
    /// `instruction` follows the transcript but is not part of it
    async fn respond(
        &self,
        transcript: &Transcript,
        instruction: Option<&str>,
    ) -> Result<String, LlmError>;
}

/// Turns a finished transcript into report text
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, LlmError>;
}

/// Durable storage for end-of-session records
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record(&self, session_id: &str, record: &SummaryRecord) -> Result<(), RecorderError>;
}

/// Out-of-band alert for severe summaries
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError>;

    /// Channel name for logs
    fn channel(&self) -> &'static str;
}

/// One client connection
#[async_trait]
pub trait Transport: Send {
    /// Next text frame; `None` once the peer has closed the connection
    async fn receive(&mut self) -> Option<Result<String, TransportError>>;

    async fn send(&mut self, text: &str) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(
        &self,
        transcript: &Transcript,
        instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        (**self).respond(transcript, instruction).await
    }
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, LlmError> {
        (**self).summarize(transcript).await
    }
}

#[async_trait]
impl<T: Recorder + ?Sized> Recorder for Arc<T> {
    async fn record(&self, session_id: &str, record: &SummaryRecord) -> Result<(), RecorderError> {
        (**self).record(session_id, record).await
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError> {
        (**self).notify(summary).await
    }

    fn channel(&self) -> &'static str {
        (**self).channel()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Interviewer backed by the shared language model
pub struct LlmResponder {
    llm: Arc<dyn LlmService>,
    system_prompt: String,
    temperature: Option<f32>,
}

impl LlmResponder {
    pub fn new(llm: Arc<dyn LlmService>, exit_token: &str, temperature: Option<f32>) -> Self {
        Self {
            llm,
            system_prompt: prompts::interview_prompt(exit_token),
            temperature,
        }
    }

    fn build_request(&self, transcript: &Transcript, instruction: Option<&str>) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = transcript
            .turns()
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::User => LlmMessage::user(turn.text.clone()),
                Speaker::Bot => LlmMessage::assistant(turn.text.clone()),
            })
            .collect();
        if let Some(instruction) = instruction {
            messages.push(LlmMessage::user(instruction));
        }

        LlmRequest::new(Some(self.system_prompt.clone()), merge_consecutive(messages))
            .with_max_tokens(1024)
            .with_temperature(self.temperature)
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn respond(
        &self,
        transcript: &Transcript,
        instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        let request = self.build_request(transcript, instruction);
        let response = self.llm.complete(&request).await?;
        Ok(response.text.trim().to_string())
    }
}

/// Report writer backed by the shared language model
pub struct LlmSummarizer {
    llm: Arc<dyn LlmService>,
    temperature: Option<f32>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmService>, temperature: Option<f32>) -> Self {
        Self { llm, temperature }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, LlmError> {
        let request = LlmRequest::new(
            None,
            vec![LlmMessage::user(prompts::summary_request(
                &transcript.render(),
            ))],
        )
        .with_max_tokens(2048)
        .with_temperature(self.temperature);
        let response = self.llm.complete(&request).await?;
        Ok(response.text)
    }
}

/// Adapter to use Database as Recorder
#[derive(Clone)]
pub struct DatabaseRecorder {
    db: Database,
}

impl DatabaseRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Recorder for DatabaseRecorder {
    async fn record(&self, session_id: &str, record: &SummaryRecord) -> Result<(), RecorderError> {
        let stored = self
            .db
            .insert_summary(session_id, record)
            .map_err(|e| RecorderError::Storage(e.to_string()))?;
        tracing::info!(
            session_id,
            summary_id = stored.id,
            username = %stored.username,
            severity = stored.severity.as_deref().unwrap_or("none"),
            "Stored session summary"
        );
        Ok(())
    }
}
