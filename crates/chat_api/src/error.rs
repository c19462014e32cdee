use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum ChatApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    InvalidRequest(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serde(JsonError),
    UnexpectedResponse(String),
}

impl ChatApiError {
    /// Returns the HTTP status for errors produced by a non-success response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }

    /// True when the failure happened while reading a response body that had
    /// already started arriving.
    pub fn is_body_error(&self) -> bool {
        matches!(self, Self::Request(error) if error.is_body() || error.is_decode())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<Value>,
}

impl ErrorPayload {
    fn message(&self) -> Option<String> {
        let value = self.error.as_ref()?;
        let message = match value {
            Value::String(text) => text.clone(),
            Value::Object(fields) => fields
                .get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)?,
            other => other.to_string(),
        };
        non_empty_string(&message).map(ToOwned::to_owned)
    }
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Io { path, source } => {
                write!(f, "I/O error reading {}: {source}", path.display())
            }
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::UnexpectedResponse(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

impl std::error::Error for ChatApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Io { source, .. } => Some(source),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract a readable message from an error response body.
///
/// The backend reports failures as `{"error": "<text>"}`; an object with a
/// `message` field is accepted too. Anything else falls back to the raw body
/// or the canonical status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.message() {
            return message;
        }
    }

    match non_empty_string(body.trim()) {
        Some(raw) => raw.to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
