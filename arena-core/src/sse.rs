//! `data: <json>\n\n` framing for the debate event stream.

use bytes::Bytes;
use serde::Serialize;

use crate::debate::{DebateEvent, StreamEnvelope};
use crate::error::{ArenaError, ArenaResult};

pub const CONTENT_TYPE: &str = "text/event-stream";

pub fn encode_frame<T: Serialize>(payload: &T) -> ArenaResult<Bytes> {
    let json = serde_json::to_string(payload)?;
    Ok(Bytes::from(format!("data: {}\n\n", json)))
}

fn strip_data_prefix(line: &str) -> Option<&str> {
    line.strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))
}

/// Incremental frame reader. Bytes go in as they arrive; complete frames come
/// out once their blank-line terminator has been seen.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the payloads of every frame it completed.
    /// Frames without `data:` lines (comments, keep-alives) are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&raw[..end]);
            if let Some(payload) = Self::payload(&text) {
                frames.push(payload);
            }
        }
        frames
    }

    /// Whatever is left once the stream closes, as a frame if it has data.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&raw);
        Self::payload(text.trim_end_matches('\n'))
    }

    fn payload(frame: &str) -> Option<String> {
        let lines: Vec<&str> = frame
            .lines()
            .filter(|line| !line.starts_with(':'))
            .filter_map(strip_data_prefix)
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Parses one frame payload into an event; `Ok(None)` for unknown types.
pub fn parse_event(payload: &str) -> ArenaResult<Option<DebateEvent>> {
    let envelope: StreamEnvelope = serde_json::from_str(payload)
        .map_err(|e| ArenaError::FrameDecode(format!("{}: {}", e, payload)))?;
    envelope.into_event()
}
