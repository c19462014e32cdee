//! Wire framing for streamed generation bodies.
//!
//! [`FrameDecoder`] turns raw, arbitrarily split byte chunks into complete
//! frame payloads; [`parse_frame`] classifies each payload.

mod decoder;
mod parser;

pub use decoder::FrameDecoder;
pub use parser::{parse_frame, FrameEvent, FrameParseError, DONE_SENTINEL};

/// Prefix that introduces a frame payload in both wire formats.
pub const DATA_MARKER: &str = "data: ";

/// Framing rules of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// Frames start at every `data: ` marker and end at the next marker or
    /// at end of line.
    TokenStream,
    /// Newline-delimited lines; only lines starting with `data: ` are frames.
    RetrievalAugmented,
}

/// One complete, whitespace-trimmed frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: String,
}

impl Frame {
    pub fn new(payload: &str) -> Self {
        Self {
            payload: payload.trim().to_owned(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}
