use serde::{Deserialize, Serialize};

use crate::url::Endpoint;

/// Request body for one generation turn.
///
/// A request carrying `doc_id` targets the retrieval-augmented endpoint;
/// without it the plain token-stream endpoint is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Client-side identifier of the user turn, echoed for backend logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "doc_id", default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
            doc_id: None,
        }
    }

    pub fn with_turn_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_document(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    pub fn is_retrieval_augmented(&self) -> bool {
        self.doc_id.is_some()
    }

    pub fn endpoint(&self) -> Endpoint {
        if self.is_retrieval_augmented() {
            Endpoint::ChatRag
        } else {
            Endpoint::ChatStream
        }
    }
}
