use serde::{Deserialize, Serialize};

/// Successful `/api/upload` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Original file name as seen by the backend.
    pub document: String,
    /// Number of text chunks indexed for retrieval.
    pub chunks: usize,
    pub doc_id: String,
}

/// One entry of the backend's server-side conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
    /// Seconds since the Unix epoch, as recorded by the backend.
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClearResponse {
    #[serde(default)]
    pub status: Option<String>,
}
