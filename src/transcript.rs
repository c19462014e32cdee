//! Ordered, observable message log.
//!
//! The transcript is append-only apart from one exception: the text of the
//! single open assistant message may be rewritten in place while its reply
//! streams in. Every change is pushed to subscribers as it happens.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Opaque message identifier, unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded document a `system` message points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub document_id: String,
    pub document_name: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document: Option<DocumentRef>,
    #[serde(default)]
    open: bool,
}

impl Message {
    fn with_role(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text: text.into(),
            document: None,
            open: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    /// Empty assistant message that accepts streamed text until closed.
    pub fn assistant_placeholder() -> Self {
        Self {
            open: true,
            ..Self::with_role(Role::Assistant, String::new())
        }
    }

    /// Finished assistant message, e.g. replayed from backend history.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role(Role::System, text)
    }

    pub fn system_with_document(text: impl Into<String>, document: DocumentRef) -> Self {
        Self {
            document: Some(document),
            ..Self::with_role(Role::System, text)
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_role(Role::Error, text)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn document(&self) -> Option<&DocumentRef> {
        self.document.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// In-place text mutation of the open assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextUpdate {
    Replace(String),
    Append(String),
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Appended(Message),
    /// Full text of the message after the update.
    Updated { id: MessageId, text: String },
    Closed { id: MessageId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("message id '{id}' already exists in the transcript")]
    DuplicateId { id: MessageId },
    #[error("assistant message '{open}' is still open")]
    AssistantAlreadyOpen { open: MessageId },
    #[error("unknown message id '{id}'")]
    UnknownId { id: MessageId },
    #[error("message '{id}' has role {role}; only assistant text can change")]
    NotAssistant { id: MessageId, role: Role },
    #[error("assistant message '{id}' is closed")]
    AssistantClosed { id: MessageId },
}

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    positions: HashMap<MessageId, usize>,
    open_assistant: Option<MessageId>,
    subscribers: Vec<UnboundedSender<TranscriptEvent>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer. It sees every change made after this call.
    pub fn subscribe(&mut self) -> UnboundedReceiver<TranscriptEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        if self.positions.contains_key(&message.id) {
            return Err(TranscriptError::DuplicateId {
                id: message.id.clone(),
            });
        }
        if message.open && message.role != Role::Assistant {
            return Err(TranscriptError::NotAssistant {
                id: message.id.clone(),
                role: message.role,
            });
        }
        if message.open {
            if let Some(open) = &self.open_assistant {
                return Err(TranscriptError::AssistantAlreadyOpen { open: open.clone() });
            }
            self.open_assistant = Some(message.id.clone());
        }

        self.positions.insert(message.id.clone(), self.messages.len());
        self.messages.push(message.clone());
        self.publish(TranscriptEvent::Appended(message));
        Ok(())
    }

    pub fn update(&mut self, id: &MessageId, update: TextUpdate) -> Result<(), TranscriptError> {
        let message = self.open_assistant_mut(id)?;
        match update {
            TextUpdate::Replace(text) => message.text = text,
            TextUpdate::Append(delta) => message.text.push_str(&delta),
        }
        let text = message.text.clone();
        self.publish(TranscriptEvent::Updated {
            id: id.clone(),
            text,
        });
        Ok(())
    }

    /// Seal an assistant message. Closing an already closed one is a no-op.
    pub fn close(&mut self, id: &MessageId) -> Result<(), TranscriptError> {
        let message = self.lookup_mut(id)?;
        if message.role != Role::Assistant {
            return Err(TranscriptError::NotAssistant {
                id: id.clone(),
                role: message.role,
            });
        }
        if !message.open {
            return Ok(());
        }

        message.open = false;
        self.open_assistant = None;
        self.publish(TranscriptEvent::Closed { id: id.clone() });
        Ok(())
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.positions.get(id).map(|&index| &self.messages[index])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn open_assistant(&self) -> Option<&MessageId> {
        self.open_assistant.as_ref()
    }

    /// Document of the first `system` message that carries one.
    pub fn document_ref(&self) -> Option<&DocumentRef> {
        self.messages
            .iter()
            .filter(|message| message.role == Role::System)
            .find_map(Message::document)
    }

    fn lookup_mut(&mut self, id: &MessageId) -> Result<&mut Message, TranscriptError> {
        match self.positions.get(id) {
            Some(&index) => Ok(&mut self.messages[index]),
            None => Err(TranscriptError::UnknownId { id: id.clone() }),
        }
    }

    fn open_assistant_mut(&mut self, id: &MessageId) -> Result<&mut Message, TranscriptError> {
        let message = self.lookup_mut(id)?;
        if message.role != Role::Assistant {
            return Err(TranscriptError::NotAssistant {
                id: id.clone(),
                role: message.role,
            });
        }
        if !message.open {
            return Err(TranscriptError::AssistantClosed { id: id.clone() });
        }
        Ok(message)
    }

    fn publish(&mut self, event: TranscriptEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
