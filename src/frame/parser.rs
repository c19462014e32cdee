use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// In-band end-of-stream marker.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classification of one frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Generated text, verbatim.
    TokenFragment(String),
    /// The backend signalled the end of generation.
    Sentinel,
    /// Nothing to render: empty payload, empty token, or a fragment holding
    /// a replacement character.
    Ignorable,
}

/// Recoverable failure to interpret a single frame.
#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("malformed frame payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("backend reported an error in-band: {message}")]
    Backend { message: String },
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    token: Option<WireToken>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireToken {
    #[serde(default)]
    text: Option<String>,
}

/// Classify one trimmed frame payload.
///
/// Frames are JSON objects shaped `{"token":{"text":"..."}}`. A frame with
/// an `error` field and no token is reported as [`FrameParseError::Backend`].
pub fn parse_frame(payload: &str) -> Result<FrameEvent, FrameParseError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(FrameEvent::Ignorable);
    }
    if payload == DONE_SENTINEL {
        return Ok(FrameEvent::Sentinel);
    }

    let frame: WireFrame = serde_json::from_str(payload)?;
    match (frame.token, frame.error) {
        (Some(token), _) => Ok(token_event(token.text)),
        (None, Some(error)) => Err(FrameParseError::Backend {
            message: match error {
                Value::String(text) => text,
                other => other.to_string(),
            },
        }),
        (None, None) => Ok(FrameEvent::Ignorable),
    }
}

fn token_event(text: Option<String>) -> FrameEvent {
    match text {
        Some(text) if !text.is_empty() && !text.contains(char::REPLACEMENT_CHARACTER) => {
            FrameEvent::TokenFragment(text)
        }
        _ => FrameEvent::Ignorable,
    }
}
