//! Transport-only client for the token-generation chat backend.
//!
//! This crate owns request building, endpoint resolution, and HTTP status
//! handling for the chat backend only. It hands streaming response bodies back
//! as raw byte chunks; frame decoding and transcript assembly live in
//! `stream_transcript`.
//!
//! Endpoints covered:
//! - `POST /api/chat/stream` and `POST /api/chat/rag` (streamed token bodies)
//! - `POST /api/upload` (document upload side-channel)
//! - `GET /api/chat/history` and `POST /api/chat/clear` (server-side history)

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod responses;
pub mod url;

pub use client::{ByteStream, ChatApiClient};
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use payload::ChatRequest;
pub use responses::{HistoryMessage, UploadReceipt};
pub use reqwest::StatusCode;
pub use url::{endpoint_url, Endpoint, DEFAULT_BASE_URL};
