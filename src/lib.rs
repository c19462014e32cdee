//! Live transcript engine for token-streaming chat backends.
//!
//! A turn flows through four pieces:
//! - [`FrameDecoder`] turns arbitrarily split body chunks into frames,
//! - [`parse_frame`] classifies each frame, isolating bad ones,
//! - [`StreamSession`] accumulates token text and drives the turn's state,
//! - [`Transcript`] records messages and pushes every change to observers.
//!
//! [`Conversation`] wires them together over a [`ChunkTransport`];
//! [`render::project`] turns accumulated text into display blocks.

pub mod config;
pub mod conversation;
pub mod frame;
pub mod logging;
pub mod render;
pub mod session;
pub mod transcript;
pub mod transport;

pub use crate::config::EnvConfig;
pub use crate::conversation::{Conversation, SendError};
pub use crate::frame::{parse_frame, Frame, FrameDecoder, FrameEvent, FrameParseError, WireFormat};
pub use crate::render::{project, Block};
pub use crate::session::{
    SessionFailure, SessionReport, SessionState, StreamSession, CONNECTION_TROUBLE_MESSAGE,
};
pub use crate::transcript::{
    DocumentRef, Message, MessageId, Role, TextUpdate, Transcript, TranscriptError,
    TranscriptEvent,
};
pub use crate::transport::{
    ChunkStream, ChunkTransport, ScriptedResponse, ScriptedTransport, StreamRequest,
    TransportError,
};
