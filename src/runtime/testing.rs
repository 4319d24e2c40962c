//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{SessionServices, Timeouts};
use crate::llm::LlmError;
use crate::report::{StructuredSummary, SummaryRecord};
use crate::state_machine::{Transcript, Turn};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Responder
// ============================================================================

/// A single responder invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderCall {
    pub turns: Vec<Turn>,
    pub instruction: Option<String>,
}

/// Mock responder that returns queued replies
#[derive(Default)]
pub struct MockResponder {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<ResponderCall>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<ResponderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(
        &self,
        transcript: &Transcript,
        instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(ResponderCall {
            turns: transcript.turns().to_vec(),
            instruction: instruction.map(String::from),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }
}

// ============================================================================
// Mock Summarizer
// ============================================================================

/// Mock summarizer with a fixed outcome
pub struct MockSummarizer {
    outcome: Result<String, LlmError>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<Vec<Turn>>>,
}

impl MockSummarizer {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(transcript.turns().to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

// ============================================================================
// Mock Recorder
// ============================================================================

/// In-memory recorder
#[derive(Default)]
pub struct MockRecorder {
    fail: bool,
    pub records: Mutex<Vec<(String, SummaryRecord)>>,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<(String, SummaryRecord)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recorder for MockRecorder {
    async fn record(&self, session_id: &str, record: &SummaryRecord) -> Result<(), RecorderError> {
        if self.fail {
            return Err(RecorderError::Storage("disk full".to_string()));
        }
        self.records
            .lock()
            .unwrap()
            .push((session_id.to_string(), record.clone()));
        Ok(())
    }
}

// ============================================================================
// Mock Notifier
// ============================================================================

/// Notifier that records alerts and optionally fails or stalls
#[derive(Default)]
pub struct MockNotifier {
    fail: bool,
    delay: Option<Duration>,
    pub alerts: Mutex<Vec<StructuredSummary>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError> {
        self.alerts.lock().unwrap().push(summary.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(NotifierError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Scripted inbound item
#[derive(Debug)]
pub enum Inbound {
    Frame(String),
    Fail(String),
}

/// Transport that replays scripted frames and records what was sent.
///
/// Once the script runs out the peer is treated as disconnected.
pub struct MockTransport {
    inbound: VecDeque<Inbound>,
    pub sent: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbound: frames
                .into_iter()
                .map(|f| Inbound::Frame(f.into()))
                .collect(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    /// Append a receive failure to the script
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.inbound.push_back(Inbound::Fail(message.into()));
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn receive(&mut self) -> Option<Result<String, TransportError>> {
        match self.inbound.pop_front()? {
            Inbound::Frame(text) => Some(Ok(text)),
            Inbound::Fail(message) => Some(Err(TransportError::Io(message))),
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if *self.closed.lock().unwrap() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

// ============================================================================
// Service bundle
// ============================================================================

/// Mocks wired into a [`SessionServices`]
pub struct MockServices {
    pub responder: Arc<MockResponder>,
    pub summarizer: Arc<MockSummarizer>,
    pub recorder: Arc<MockRecorder>,
    pub notifier: Arc<MockNotifier>,
    pub timeouts: Timeouts,
}

impl MockServices {
    pub fn new(responder: MockResponder, summarizer: MockSummarizer) -> Self {
        Self {
            responder: Arc::new(responder),
            summarizer: Arc::new(summarizer),
            recorder: Arc::new(MockRecorder::new()),
            notifier: Arc::new(MockNotifier::new()),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_recorder(mut self, recorder: MockRecorder) -> Self {
        self.recorder = Arc::new(recorder);
        self
    }

    pub fn with_notifier(mut self, notifier: MockNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn services(&self) -> SessionServices {
        SessionServices {
            responder: self.responder.clone(),
            summarizer: self.summarizer.clone(),
            recorder: self.recorder.clone(),
            notifier: self.notifier.clone(),
            timeouts: self.timeouts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use crate::runtime::{SessionOutcome, SessionRuntime};
    use crate::state_machine::state::{
        CLOSING_NOTICE, EXIT_ACKNOWLEDGMENT, INVALID_IDENTITY_MESSAGE, ROUTINE_CHECK_WELCOME,
        START_CONVERSATION_SEED,
    };
    use crate::state_machine::{
        ExitMatch, ExitPolicy, SessionContext, SessionProfile, TerminationReason,
    };

    const ANA: &str = r#"{"name":"Ana","username":"ana1","age":30,"gender":"F"}"#;

    fn intake() -> SessionContext {
        SessionContext::new("session-1", SessionProfile::intake(), ExitPolicy::default())
    }

    fn routine() -> SessionContext {
        SessionContext::new(
            "session-2",
            SessionProfile::routine_check(),
            ExitPolicy::default(),
        )
    }

    async fn run(
        context: SessionContext,
        mocks: &MockServices,
        transport: MockTransport,
    ) -> (SessionOutcome, Vec<String>, bool) {
        let sent = transport.sent.clone();
        let closed = transport.closed.clone();
        let outcome = SessionRuntime::new(context, mocks.services(), transport)
            .run()
            .await;
        let sent = sent.lock().unwrap().clone();
        let closed = *closed.lock().unwrap();
        (outcome, sent, closed)
    }

    #[tokio::test]
    async fn test_mock_responder_queue() {
        let responder = MockResponder::new();
        responder.queue_reply("first");

        let transcript = Transcript::new();
        assert_eq!(responder.respond(&transcript, None).await.unwrap(), "first");
        assert!(responder.respond(&transcript, None).await.is_err());
        assert_eq!(responder.recorded_calls().len(), 2);
    }

    /// Valid identity starts the interview with a seeded reply
    #[tokio::test]
    async fn test_identity_starts_interview() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana! How are you feeling today?");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, sent, _) = run(intake(), &mocks, MockTransport::new([ANA])).await;

        let calls = mocks.responder.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].instruction.as_deref(), Some(START_CONVERSATION_SEED));
        assert_eq!(
            calls[0].turns,
            vec![Turn::user(
                "User Info: Name=Ana, Username=ana1, Age=30, Gender=F"
            )]
        );
        assert_eq!(sent, vec!["", "Hi Ana! How are you feeling today?"]);
        assert_eq!(outcome.reason, TerminationReason::ConnectionClosed);
        assert_eq!(outcome.turns, 2);
    }

    /// Bad identity gets the format message and the session keeps waiting
    #[tokio::test]
    async fn test_invalid_identity_then_retry() {
        let responder = MockResponder::new();
        responder.queue_reply("Hello Ana");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (_, sent, _) = run(intake(), &mocks, MockTransport::new(["hello", ANA])).await;

        assert_eq!(sent, vec!["", INVALID_IDENTITY_MESSAGE, "Hello Ana"]);
        assert_eq!(mocks.responder.recorded_calls().len(), 1);
    }

    /// Nothing is summarized when no turn was ever recorded
    #[tokio::test]
    async fn test_empty_transcript_skips_summary() {
        let mocks = MockServices::new(MockResponder::new(), MockSummarizer::returning("{}"));

        let (outcome, sent, _) = run(intake(), &mocks, MockTransport::new(["hello"])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionClosed);
        assert_eq!(sent, vec!["", INVALID_IDENTITY_MESSAGE]);
        assert_eq!(mocks.summarizer.call_count(), 0);
        assert!(mocks.recorder.recorded().is_empty());
    }

    /// User exit: summarize once, escalate, acknowledge, close
    #[tokio::test]
    async fn test_user_exit_full_burst() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana, how did you sleep?");
        responder.queue_reply("How many hours?");
        let mocks = MockServices::new(
            responder,
            MockSummarizer::returning(r#"{"severity":"Mild","symptoms":["poor sleep"]}"#),
        );

        let (outcome, sent, closed) = run(
            intake(),
            &mocks,
            MockTransport::new([ANA, "I slept badly", "EXIT"]),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::UserRequestedExit);
        assert_eq!(mocks.responder.recorded_calls().len(), 2);
        assert_eq!(mocks.summarizer.call_count(), 1);
        assert_eq!(
            sent,
            vec![
                "",
                "Hi Ana, how did you sleep?",
                "How many hours?",
                "You are going good! I will catch up with you tomorrow.",
                EXIT_ACKNOWLEDGMENT,
            ]
        );
        assert!(closed);

        let records = mocks.recorder.recorded();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "session-1");
        assert_eq!(records[0].1.username(), "ana1");
        assert_eq!(records[0].1.severity(), Some(Severity::Mild));
        assert_eq!(mocks.notifier.alert_count(), 0);
    }

    /// Free-text summaries are stored raw without escalation
    #[tokio::test]
    async fn test_unstructured_summary_fallback() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(
            responder,
            MockSummarizer::returning("Patient reports poor sleep."),
        );

        let (_, sent, _) = run(intake(), &mocks, MockTransport::new([ANA, "exit"])).await;

        let records = mocks.recorder.recorded();
        assert_eq!(
            records[0].1,
            SummaryRecord::Raw {
                username: "ana1".to_string(),
                raw_summary: "Patient reports poor sleep.".to_string(),
            }
        );
        assert_eq!(sent.last().map(String::as_str), Some(EXIT_ACKNOWLEDGMENT));
        assert!(!sent.iter().any(|s| s.contains("Severity")));
    }

    /// Severe summaries page the doctor; a failing notifier does not block the goodbye
    #[tokio::test]
    async fn test_severe_summary_notifies_even_when_notifier_fails() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(
            responder,
            MockSummarizer::returning("```json\n{\"severity\": \"SEVERE\"}\n```"),
        )
        .with_notifier(MockNotifier::failing());

        let (outcome, sent, closed) =
            run(intake(), &mocks, MockTransport::new([ANA, "chest pain, exit"])).await;

        assert_eq!(outcome.reason, TerminationReason::UserRequestedExit);
        assert_eq!(mocks.notifier.alert_count(), 1);
        assert_eq!(
            mocks.notifier.alerts.lock().unwrap()[0].fields()["username"],
            "ana1"
        );
        let tail: Vec<_> = sent.iter().rev().take(2).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                "Alert sent to doctor due to severe symptoms.".to_string(),
                EXIT_ACKNOWLEDGMENT.to_string()
            ]
        );
        assert!(closed);
    }

    /// A stalled notifier is cut off by its timeout
    #[tokio::test]
    async fn test_slow_notifier_is_bounded() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(responder, MockSummarizer::returning(r#"{"severity":"severe"}"#))
            .with_notifier(MockNotifier::new().with_delay(Duration::from_secs(30)))
            .with_timeouts(Timeouts {
                notifier: Duration::from_millis(50),
                ..Timeouts::default()
            });

        let started = std::time::Instant::now();
        let (_, sent, _) = run(intake(), &mocks, MockTransport::new([ANA, "EXIT"])).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(sent.last().map(String::as_str), Some(EXIT_ACKNOWLEDGMENT));
        assert_eq!(mocks.notifier.alert_count(), 1);
    }

    /// Abrupt disconnect: summary still recorded, nothing else sent
    #[tokio::test]
    async fn test_disconnect_mid_interview() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_reply("Tell me more");
        let mocks = MockServices::new(responder, MockSummarizer::returning(r#"{"severity":"severe"}"#));

        let (outcome, sent, closed) =
            run(intake(), &mocks, MockTransport::new([ANA, "my head hurts"])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionClosed);
        assert_eq!(sent, vec!["", "Hi Ana", "Tell me more"]);
        assert!(!closed);
        assert_eq!(mocks.summarizer.call_count(), 1);
        assert_eq!(mocks.recorder.recorded().len(), 1);
        assert_eq!(mocks.notifier.alert_count(), 1);
    }

    /// Receive errors end the session without further writes
    #[tokio::test]
    async fn test_transport_failure() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, sent, closed) = run(
            intake(),
            &mocks,
            MockTransport::new([ANA]).then_fail("connection reset"),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionError);
        assert_eq!(sent, vec!["", "Hi Ana"]);
        assert!(!closed);
        assert_eq!(mocks.summarizer.call_count(), 1);
    }

    /// Responder errors end the session with a closing notice
    #[tokio::test]
    async fn test_responder_failure() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_error(LlmError::server_error("overloaded"));
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, sent, closed) =
            run(intake(), &mocks, MockTransport::new([ANA, "I feel dizzy"])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionError);
        assert_eq!(sent.last().map(String::as_str), Some(CLOSING_NOTICE));
        assert!(closed);
        assert_eq!(mocks.summarizer.call_count(), 1);
        assert_eq!(mocks.recorder.recorded().len(), 1);
    }

    /// Error endings stay quiet apart from the closing notice, but still page the doctor
    #[tokio::test]
    async fn test_responder_failure_with_severe_summary_only_sends_closing_notice() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_error(LlmError::server_error("overloaded"));
        let mocks = MockServices::new(
            responder,
            MockSummarizer::returning(r#"{"severity":"severe"}"#),
        );

        let (outcome, sent, closed) =
            run(intake(), &mocks, MockTransport::new([ANA, "chest pain"])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionError);
        assert_eq!(sent, vec!["", "Hi Ana", CLOSING_NOTICE]);
        assert!(closed);
        assert_eq!(mocks.recorder.recorded().len(), 1);
        assert_eq!(mocks.notifier.alert_count(), 1);
    }

    /// The routine check does not echo its summary after an error
    #[tokio::test]
    async fn test_routine_check_failure_skips_summary_echo() {
        let responder = MockResponder::new();
        responder.queue_error(LlmError::server_error("overloaded"));
        let mocks = MockServices::new(responder, MockSummarizer::returning("Headache."));

        let (outcome, sent, _) =
            run(routine(), &mocks, MockTransport::new(["I have a headache"])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionError);
        assert_eq!(sent, vec![ROUTINE_CHECK_WELCOME, CLOSING_NOTICE]);
        assert_eq!(mocks.summarizer.call_count(), 1);
    }

    /// A stalled responder times out into a connection error
    #[tokio::test]
    async fn test_responder_timeout() {
        let responder = MockResponder::new().with_delay(Duration::from_secs(30));
        responder.queue_reply("too late");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}")).with_timeouts(
            Timeouts {
                responder: Duration::from_millis(50),
                ..Timeouts::default()
            },
        );

        let (outcome, sent, _) = run(intake(), &mocks, MockTransport::new([ANA])).await;

        assert_eq!(outcome.reason, TerminationReason::ConnectionError);
        assert_eq!(sent, vec!["", CLOSING_NOTICE]);
        assert_eq!(mocks.summarizer.call_count(), 1);
    }

    /// A summarizer failure skips the record but not the goodbye
    #[tokio::test]
    async fn test_summarizer_failure_still_acknowledges() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(
            responder,
            MockSummarizer::failing(LlmError::timeout(Duration::from_secs(90))),
        );

        let (_, sent, closed) = run(intake(), &mocks, MockTransport::new([ANA, "exit"])).await;

        assert!(mocks.recorder.recorded().is_empty());
        assert_eq!(sent.last().map(String::as_str), Some(EXIT_ACKNOWLEDGMENT));
        assert!(closed);
    }

    /// A stalled summarizer is bounded as well
    #[tokio::test]
    async fn test_summarizer_timeout() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(
            responder,
            MockSummarizer::returning("{}").with_delay(Duration::from_secs(30)),
        )
        .with_timeouts(Timeouts {
            summarizer: Duration::from_millis(50),
            ..Timeouts::default()
        });

        let (_, sent, _) = run(intake(), &mocks, MockTransport::new([ANA, "exit"])).await;

        assert!(mocks.recorder.recorded().is_empty());
        assert_eq!(sent.last().map(String::as_str), Some(EXIT_ACKNOWLEDGMENT));
    }

    /// Recorder failures are logged only
    #[tokio::test]
    async fn test_recorder_failure_is_not_fatal() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(responder, MockSummarizer::returning(r#"{"severity":"moderate"}"#))
            .with_recorder(MockRecorder::failing());

        let (_, sent, _) = run(intake(), &mocks, MockTransport::new([ANA, "exit"])).await;

        assert_eq!(
            sent[sent.len() - 2..],
            [
                "You should consult the doctor.".to_string(),
                EXIT_ACKNOWLEDGMENT.to_string()
            ]
        );
    }

    /// Blank frames never reach the responder
    #[tokio::test]
    async fn test_blank_frames_ignored() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, _, _) =
            run(intake(), &mocks, MockTransport::new([ANA, "", "   ", "\n"])).await;

        assert_eq!(mocks.responder.recorded_calls().len(), 1);
        assert_eq!(outcome.turns, 2);
    }

    /// The responder ending the session on its own
    #[tokio::test]
    async fn test_model_requested_exit() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_reply("EXIT");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, sent, closed) =
            run(intake(), &mocks, MockTransport::new([ANA, "I am fine"])).await;

        assert_eq!(outcome.reason, TerminationReason::ModelRequestedExit);
        assert_eq!(
            sent,
            vec![
                "",
                "Hi Ana",
                "EXIT",
                "Severity not specified.",
                EXIT_ACKNOWLEDGMENT
            ]
        );
        assert!(closed);
    }

    /// Under the default exact policy a mid-sentence mention keeps the interview going
    #[tokio::test]
    async fn test_mid_sentence_exit_mention_with_exact_policy() {
        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_reply("I have all I need, Ana. Please say exit.");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));

        let (outcome, _, _) =
            run(intake(), &mocks, MockTransport::new([ANA, "I am fine"])).await;
        assert_eq!(outcome.reason, TerminationReason::ConnectionClosed);

        let responder = MockResponder::new();
        responder.queue_reply("Hi Ana");
        responder.queue_reply("I have all I need, Ana. Please say exit.");
        let mocks = MockServices::new(responder, MockSummarizer::returning("{}"));
        let context = SessionContext::new(
            "session-3",
            SessionProfile::intake(),
            ExitPolicy::new("EXIT", ExitMatch::Contains),
        );

        let (outcome, _, _) = run(context, &mocks, MockTransport::new([ANA, "I am fine"])).await;
        assert_eq!(outcome.reason, TerminationReason::ModelRequestedExit);
    }

    /// Routine check: welcome, no identity, summary echoed, no escalation
    #[tokio::test]
    async fn test_routine_check_session() {
        let responder = MockResponder::new();
        responder.queue_reply("Sorry to hear that. Since when?");
        let summary = r#"{"severity":"severe","symptoms":["headache"]}"#;
        let mocks = MockServices::new(responder, MockSummarizer::returning(summary));

        let (outcome, sent, closed) = run(
            routine(),
            &mocks,
            MockTransport::new(["I have a headache", "EXIT"]),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::UserRequestedExit);
        assert_eq!(
            sent,
            vec![
                ROUTINE_CHECK_WELCOME,
                "Sorry to hear that. Since when?",
                summary,
                EXIT_ACKNOWLEDGMENT
            ]
        );
        assert!(closed);

        let calls = mocks.responder.recorded_calls();
        assert_eq!(calls[0].instruction, None);
        assert_eq!(calls[0].turns, vec![Turn::user("I have a headache")]);

        let records = mocks.recorder.recorded();
        assert_eq!(records[0].1.username(), "unknown");
        assert_eq!(mocks.notifier.alert_count(), 0);
    }
}
