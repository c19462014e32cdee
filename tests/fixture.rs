#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use stream_transcript::{Frame, FrameDecoder, WireFormat};

pub fn read_fixture(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read(&path).unwrap_or_else(|err| panic!("failed to read fixture {name}: {err}"))
}

/// Primary-format frame carrying `text`, without a line terminator.
pub fn token_frame(text: &str) -> String {
    format!(
        "data: {}",
        serde_json::json!({ "token": { "text": text } })
    )
}

/// Retrieval-format line carrying `text`.
pub fn rag_line(text: &str) -> String {
    format!("{}\n", token_frame(text))
}

pub fn decode_chunks<C: AsRef<[u8]>>(format: WireFormat, chunks: &[C]) -> Vec<String> {
    let mut decoder = FrameDecoder::new(format);
    let mut payloads = Vec::new();
    for chunk in chunks {
        payloads.extend(decoder.feed(chunk.as_ref()).into_iter().map(Frame::into_payload));
    }
    payloads.extend(decoder.finish().into_iter().map(Frame::into_payload));
    payloads
}

pub fn decode_whole(format: WireFormat, body: &[u8]) -> Vec<String> {
    decode_chunks(format, &[body])
}
