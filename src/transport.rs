//! Seam between the streaming session and whatever produces body chunks.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use chat_api::{ChatApiClient, ChatApiError, ChatRequest};
use futures_util::future::{self, BoxFuture};
use futures_util::stream::{self, BoxStream};
use futures_util::{FutureExt, StreamExt};
use thiserror::Error;

use crate::frame::WireFormat;

/// Body of an open generation response, chunk by chunk.
pub type ChunkStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Outbound payload of one turn. Immutable once handed to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub message: String,
    pub turn_id: String,
    pub document_id: Option<String>,
}

impl StreamRequest {
    pub fn new(message: impl Into<String>, turn_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            turn_id: turn_id.into(),
            document_id: None,
        }
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Framing the response to this request will use.
    pub fn format(&self) -> WireFormat {
        if self.document_id.is_some() {
            WireFormat::RetrievalAugmented
        } else {
            WireFormat::TokenStream
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Api(ChatApiError),
    #[error("{0}")]
    Scripted(String),
}

impl From<ChatApiError> for TransportError {
    fn from(error: ChatApiError) -> Self {
        match error {
            ChatApiError::Status(status, message) => Self::Status {
                status: status.as_u16(),
                message,
            },
            other => Self::Api(other),
        }
    }
}

/// Opens a streamed response for a request.
///
/// A returned stream yields body chunks in arrival order; an `Err` from
/// `open` means no body was ever produced.
pub trait ChunkTransport: Send + Sync {
    fn open<'a>(
        &'a self,
        request: &'a StreamRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, TransportError>>;
}

impl ChunkTransport for ChatApiClient {
    fn open<'a>(
        &'a self,
        request: &'a StreamRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, TransportError>> {
        async move {
            let mut payload =
                ChatRequest::new(request.message.clone()).with_turn_id(request.turn_id.clone());
            if let Some(document_id) = &request.document_id {
                payload = payload.with_document(document_id.clone());
            }

            let body = self.open_stream(&payload).await?;
            Ok(body.map(|chunk| chunk.map_err(TransportError::from)).boxed())
        }
        .boxed()
    }
}

/// One canned response for [`ScriptedTransport`].
#[derive(Debug)]
pub enum ScriptedResponse {
    /// The stream opens and yields these items in order.
    Stream(Vec<Result<Bytes, TransportError>>),
    /// Opening the stream fails.
    Refuse(TransportError),
}

impl ScriptedResponse {
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self::Stream(chunks.into_iter().map(|chunk| Ok(chunk.into())).collect())
    }

    /// Yield `chunks`, then fail mid-stream with `reason`.
    pub fn chunks_then_error<I, C>(chunks: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let mut items: Vec<_> = chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        items.push(Err(TransportError::Scripted(reason.into())));
        Self::Stream(items)
    }

    pub fn refuse(reason: impl Into<String>) -> Self {
        Self::Refuse(TransportError::Scripted(reason.into()))
    }
}

/// In-memory transport replaying canned responses in order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<StreamRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: ScriptedResponse) {
        lock_unpoisoned(&self.responses).push_back(response);
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<StreamRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock_unpoisoned(&self.responses).len()
    }
}

impl ChunkTransport for ScriptedTransport {
    fn open<'a>(
        &'a self,
        request: &'a StreamRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, TransportError>> {
        lock_unpoisoned(&self.requests).push(request.clone());
        let next = lock_unpoisoned(&self.responses).pop_front();

        let result = match next {
            Some(ScriptedResponse::Stream(items)) => Ok(stream::iter(items).boxed()),
            Some(ScriptedResponse::Refuse(error)) => Err(error),
            None => Err(TransportError::Scripted(
                "no scripted response left".to_owned(),
            )),
        };
        future::ready(result).boxed()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
