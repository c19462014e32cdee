//! Turn orchestration over a transcript and a transport.

use chat_api::UploadReceipt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::session::{SessionReport, StreamSession};
use crate::transcript::{
    DocumentRef, Message, MessageId, Transcript, TranscriptError, TranscriptEvent,
};
use crate::transport::{ChunkTransport, StreamRequest};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("no document has been uploaded to this conversation")]
    NoDocument,
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Confirmation text for a successful document upload.
pub fn upload_confirmation(receipt: &UploadReceipt) -> String {
    format!(
        "Document \"{}\" uploaded successfully with {} chunks processed.",
        receipt.document, receipt.chunks
    )
}

/// Error text for a failed document upload.
pub fn upload_failure(reason: &str) -> String {
    format!("Error uploading document: {reason}")
}

/// A transcript plus the transport its turns stream from.
///
/// Sending takes `&mut self`, so at most one turn is in flight per
/// conversation.
#[derive(Debug)]
pub struct Conversation<T> {
    transport: T,
    transcript: Transcript,
}

impl<T: ChunkTransport> Conversation<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<TranscriptEvent> {
        self.transcript.subscribe()
    }

    /// Ask in the plain token-stream mode.
    pub async fn send(&mut self, text: &str) -> Result<SessionReport, SendError> {
        let session = self.begin_turn(text, None)?;
        Ok(self.run_turn(session).await)
    }

    /// Ask about the document recorded by the first upload.
    pub async fn send_with_document(&mut self, text: &str) -> Result<SessionReport, SendError> {
        let document_id = self
            .transcript
            .document_ref()
            .map(|document| document.document_id.clone())
            .ok_or(SendError::NoDocument)?;
        let session = self.begin_turn(text, Some(document_id))?;
        Ok(self.run_turn(session).await)
    }

    /// Append the user message and an empty assistant message, and return the
    /// session that will fill it.
    ///
    /// The returned session must be passed to [`Conversation::run_turn`];
    /// until then the assistant message stays open and no other turn can
    /// begin.
    pub fn begin_turn(
        &mut self,
        text: &str,
        document_id: Option<String>,
    ) -> Result<StreamSession, SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }
        if let Some(open) = self.transcript.open_assistant() {
            return Err(TranscriptError::AssistantAlreadyOpen { open: open.clone() }.into());
        }

        let user = Message::user(text);
        let mut request = StreamRequest::new(text, user.id().as_str());
        if let Some(document_id) = document_id {
            request = request.with_document(document_id);
        }
        let placeholder = Message::assistant_placeholder();
        let assistant_id = placeholder.id().clone();

        self.transcript.append(user)?;
        self.transcript.append(placeholder)?;
        Ok(StreamSession::new(request, assistant_id))
    }

    pub async fn run_turn(&mut self, session: StreamSession) -> SessionReport {
        session.run(&self.transport, &mut self.transcript).await
    }

    /// Record a successful upload as a `system` message carrying its document.
    pub fn record_upload(&mut self, receipt: &UploadReceipt) -> Result<MessageId, TranscriptError> {
        let document = DocumentRef {
            document_id: receipt.doc_id.clone(),
            document_name: receipt.document.clone(),
            chunk_count: receipt.chunks,
        };
        let message = Message::system_with_document(upload_confirmation(receipt), document);
        let id = message.id().clone();
        self.transcript.append(message)?;
        info!(document = %receipt.document, doc_id = %receipt.doc_id, "document recorded");
        Ok(id)
    }

    pub fn record_upload_failure(&mut self, reason: &str) -> Result<MessageId, TranscriptError> {
        let message = Message::error(upload_failure(reason));
        let id = message.id().clone();
        self.transcript.append(message)?;
        Ok(id)
    }
}
