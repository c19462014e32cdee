use tracing::trace;

use super::{Frame, WireFormat, DATA_MARKER};

/// Incremental decoder from byte chunks to frames.
///
/// Chunk boundaries carry no meaning: feeding a body in any split produces
/// the same frames as feeding it whole. Bytes of a character split across
/// chunks are held back until the rest arrives; invalid bytes decode to
/// U+FFFD.
#[derive(Debug)]
pub struct FrameDecoder {
    format: WireFormat,
    utf8_carry: Vec<u8>,
    buffer: String,
    /// Prefix of `buffer` already searched without finding a frame end.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            utf8_carry: Vec::new(),
            buffer: String::new(),
            scanned: 0,
        }
    }

    /// Decode one chunk and return every frame it completes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let text = self.decode_utf8(bytes);
        self.buffer.push_str(&text);

        let mut frames = Vec::new();
        match self.format {
            WireFormat::TokenStream => self.drain_marked_frames(&mut frames),
            WireFormat::RetrievalAugmented => self.drain_lines(&mut frames),
        }
        frames
    }

    /// Flush the undelimited tail at end of stream.
    ///
    /// A character still incomplete at this point is dropped.
    pub fn finish(self) -> Vec<Frame> {
        if !self.utf8_carry.is_empty() {
            trace!(
                bytes = self.utf8_carry.len(),
                "dropping incomplete trailing character"
            );
        }

        let mut frames = Vec::new();
        match self.format {
            WireFormat::TokenStream => {
                if let Some(payload) = self.buffer.strip_prefix(DATA_MARKER) {
                    frames.push(Frame::new(payload));
                }
            }
            WireFormat::RetrievalAugmented => {
                if let Some(frame) = data_line(&self.buffer) {
                    frames.push(frame);
                }
            }
        }
        frames
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.utf8_carry);
        input.extend_from_slice(bytes);

        let mut text = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match error.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + len..];
                        }
                        None => {
                            self.utf8_carry = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    fn drain_marked_frames(&mut self, frames: &mut Vec<Frame>) {
        loop {
            let Some(start) = self.buffer.find(DATA_MARKER) else {
                let keep = partial_marker_suffix(&self.buffer);
                let cut = self.buffer.len() - keep;
                self.buffer.drain(..cut);
                self.scanned = 0;
                return;
            };

            // `scanned` is only set while the buffer starts at a marker.
            let payload_start = start + DATA_MARKER.len();
            let resume = self.scanned.saturating_sub(payload_start);
            let rest = &self.buffer[payload_start..];
            let next_marker = find_from(
                rest,
                DATA_MARKER,
                resume.saturating_sub(DATA_MARKER.len() - 1),
            );
            let newline = find_from(rest, "\n", resume);

            let (end, consumed) = match (next_marker, newline) {
                (Some(marker), Some(line)) if line < marker => (line, line + 1),
                (Some(marker), _) => (marker, marker),
                (None, Some(line)) => (line, line + 1),
                (None, None) => {
                    self.buffer.drain(..start);
                    self.scanned = self.buffer.len();
                    return;
                }
            };

            frames.push(Frame::new(&rest[..end]));
            self.buffer.drain(..payload_start + consumed);
            self.scanned = 0;
        }
    }

    fn drain_lines(&mut self, frames: &mut Vec<Frame>) {
        while let Some(newline) = find_from(&self.buffer, "\n", self.scanned) {
            let line: String = self.buffer.drain(..=newline).collect();
            self.scanned = 0;
            if let Some(frame) = data_line(&line) {
                frames.push(frame);
            }
        }
        self.scanned = self.buffer.len();
    }
}

/// `str::find` starting at byte `from`, moved back to a character boundary.
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let mut from = from.min(haystack.len());
    while !haystack.is_char_boundary(from) {
        from -= 1;
    }
    haystack[from..].find(needle).map(|index| from + index)
}

fn data_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.strip_prefix(DATA_MARKER).map(Frame::new)
}

/// Length of the longest buffer suffix that could still grow into a marker.
fn partial_marker_suffix(buffer: &str) -> usize {
    (1..DATA_MARKER.len())
        .rev()
        .find(|&len| buffer.ends_with(&DATA_MARKER[..len]))
        .unwrap_or(0)
}
