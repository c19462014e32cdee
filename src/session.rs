//! One request/response lifecycle.
//!
//! ```text
//! Idle -> Sending -> Streaming -> Completed
//!            |           |
//!            +-----------+-----> Failed
//! ```
//!
//! A session owns its accumulated text and the one assistant message it was
//! created for. `run` consumes the session, so nothing can touch the
//! transcript on its behalf after it reaches a terminal state.

use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::frame::{parse_frame, Frame, FrameDecoder, FrameEvent};
use crate::transcript::{Message, MessageId, TextUpdate, Transcript};
use crate::transport::{ChunkTransport, StreamRequest, TransportError};

/// Text shown to the user when a turn fails for any transport reason.
pub const CONNECTION_TROUBLE_MESSAGE: &str = "Sorry, I'm having trouble connecting to the server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Sending)
                | (Self::Sending, Self::Streaming)
                | (Self::Sending, Self::Failed)
                | (Self::Streaming, Self::Completed)
                | (Self::Streaming, Self::Failed)
        )
    }
}

/// Why a session ended in [`SessionState::Failed`].
#[derive(Debug, Error)]
pub enum SessionFailure {
    #[error("could not establish the response stream: {0}")]
    Establish(#[source] TransportError),
    #[error("response stream interrupted: {0}")]
    Interrupted(#[source] TransportError),
}

impl SessionFailure {
    pub fn transport_error(&self) -> &TransportError {
        match self {
            Self::Establish(error) | Self::Interrupted(error) => error,
        }
    }
}

/// Outcome of [`StreamSession::run`].
#[derive(Debug)]
pub struct SessionReport {
    pub state: SessionState,
    pub accumulated_text: String,
    pub parse_failures: usize,
    pub assistant_id: MessageId,
    pub failure: Option<SessionFailure>,
}

impl SessionReport {
    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }
}

enum Flow {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct StreamSession {
    request: StreamRequest,
    assistant_id: MessageId,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    accumulated_text: String,
    parse_failures: usize,
}

impl StreamSession {
    /// `assistant_id` must name the open assistant message this session
    /// streams into.
    pub fn new(request: StreamRequest, assistant_id: MessageId) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            request,
            assistant_id,
            state: SessionState::Idle,
            state_tx,
            accumulated_text: String::new(),
            parse_failures: 0,
        }
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn assistant_id(&self) -> &MessageId {
        &self.assistant_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn parse_failures(&self) -> usize {
        self.parse_failures
    }

    /// Observe state transitions. The receiver keeps the terminal state after
    /// the session is gone.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Drive the request to a terminal state, streaming text into the
    /// transcript as it arrives.
    pub async fn run<T>(mut self, transport: &T, transcript: &mut Transcript) -> SessionReport
    where
        T: ChunkTransport + ?Sized,
    {
        self.transition(SessionState::Sending);
        info!(
            turn_id = %self.request.turn_id,
            format = ?self.request.format(),
            "opening response stream"
        );

        let mut body = match transport.open(&self.request).await {
            Ok(body) => body,
            Err(error) => return self.fail(transcript, SessionFailure::Establish(error)),
        };

        let mut decoder = FrameDecoder::new(self.request.format());
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    let failure = if self.state == SessionState::Sending {
                        SessionFailure::Establish(error)
                    } else {
                        SessionFailure::Interrupted(error)
                    };
                    return self.fail(transcript, failure);
                }
            };

            self.enter_streaming();
            let frames = decoder.feed(&chunk);
            if let Flow::Stop = self.consume(frames, transcript) {
                debug!(turn_id = %self.request.turn_id, "sentinel received; discarding rest of body");
                drop(body);
                return self.complete(transcript);
            }
        }

        self.enter_streaming();
        let frames = decoder.finish();
        self.consume(frames, transcript);
        self.complete(transcript)
    }

    fn consume(&mut self, frames: Vec<Frame>, transcript: &mut Transcript) -> Flow {
        for frame in frames {
            match parse_frame(frame.payload()) {
                Ok(FrameEvent::TokenFragment(text)) => {
                    debug!(bytes = text.len(), "token fragment");
                    self.accumulated_text.push_str(&text);
                    let update = TextUpdate::Replace(self.accumulated_text.clone());
                    if let Err(error) = transcript.update(&self.assistant_id, update) {
                        error!(%error, "failed to update assistant message");
                    }
                }
                Ok(FrameEvent::Sentinel) => return Flow::Stop,
                Ok(FrameEvent::Ignorable) => debug!("ignorable frame"),
                Err(error) => {
                    self.parse_failures += 1;
                    warn!(
                        %error,
                        payload = frame.payload(),
                        failures = self.parse_failures,
                        "skipping unparseable frame"
                    );
                }
            }
        }
        Flow::Continue
    }

    fn enter_streaming(&mut self) {
        if self.state == SessionState::Sending {
            self.transition(SessionState::Streaming);
        }
    }

    fn complete(mut self, transcript: &mut Transcript) -> SessionReport {
        self.close_assistant(transcript);
        self.transition(SessionState::Completed);
        info!(
            turn_id = %self.request.turn_id,
            chars = self.accumulated_text.chars().count(),
            parse_failures = self.parse_failures,
            "response stream completed"
        );
        self.into_report(None)
    }

    fn fail(mut self, transcript: &mut Transcript, failure: SessionFailure) -> SessionReport {
        error!(turn_id = %self.request.turn_id, error = %failure, "response stream failed");
        self.close_assistant(transcript);
        if let Err(error) = transcript.append(Message::error(CONNECTION_TROUBLE_MESSAGE)) {
            error!(%error, "failed to append connection error message");
        }
        self.transition(SessionState::Failed);
        self.into_report(Some(failure))
    }

    fn close_assistant(&self, transcript: &mut Transcript) {
        if let Err(error) = transcript.close(&self.assistant_id) {
            error!(%error, "failed to close assistant message");
        }
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(from = ?self.state, to = ?next, "ignoring invalid session transition");
            return;
        }
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
        self.state_tx.send_replace(next);
    }

    fn into_report(self, failure: Option<SessionFailure>) -> SessionReport {
        SessionReport {
            state: self.state,
            accumulated_text: self.accumulated_text,
            parse_failures: self.parse_failures,
            assistant_id: self.assistant_id,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ScriptedResponse, ScriptedTransport};

    fn setup() -> (Transcript, MessageId) {
        let mut transcript = Transcript::new();
        let placeholder = Message::assistant_placeholder();
        let id = placeholder.id().clone();
        transcript.append(placeholder).expect("placeholder");
        (transcript, id)
    }

    #[test]
    fn only_forward_transitions_are_legal() {
        use SessionState::*;
        assert!(Idle.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Streaming));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Streaming));
        assert!(Completed.is_terminal() && Failed.is_terminal());
        assert!(!Streaming.is_terminal());
    }

    #[tokio::test]
    async fn watch_state_ends_at_terminal_state() {
        let (mut transcript, id) = setup();
        let transport = ScriptedTransport::new([ScriptedResponse::chunks([
            "data: {\"token\":{\"text\":\"ok\"}}\n",
        ])]);
        let session = StreamSession::new(StreamRequest::new("hi", "t-1"), id);
        let state = session.watch_state();
        assert_eq!(*state.borrow(), SessionState::Idle);

        let report = session.run(&transport, &mut transcript).await;
        assert_eq!(report.state, SessionState::Completed);
        assert_eq!(*state.borrow(), SessionState::Completed);
        assert_eq!(report.accumulated_text, "ok");
    }

    #[tokio::test]
    async fn empty_body_completes_with_empty_text() {
        let (mut transcript, id) = setup();
        let transport = ScriptedTransport::new([ScriptedResponse::Stream(Vec::new())]);

        let report = StreamSession::new(StreamRequest::new("hi", "t-1"), id.clone())
            .run(&transport, &mut transcript)
            .await;

        assert!(report.is_completed());
        assert!(report.accumulated_text.is_empty());
        let message = transcript.get(&id).expect("assistant");
        assert!(!message.is_open());
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn error_before_first_chunk_counts_as_establish_failure() {
        let (mut transcript, id) = setup();
        let transport = ScriptedTransport::new([ScriptedResponse::chunks_then_error(
            Vec::<&'static str>::new(),
            "reset",
        )]);

        let report = StreamSession::new(StreamRequest::new("hi", "t-1"), id)
            .run(&transport, &mut transcript)
            .await;

        assert_eq!(report.state, SessionState::Failed);
        assert!(matches!(report.failure, Some(SessionFailure::Establish(_))));
    }
}
