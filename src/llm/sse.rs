//! Server-sent-event decoding for streamed chat completions.
//!
//! Only `data: ` lines carry payloads. `data: [DONE]` ends the stream and
//! lines that are not valid JSON are skipped.

use serde::Deserialize;
use tracing::debug;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One decoded SSE payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDelta {
    pub reasoning: Option<String>,
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(StreamDelta),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<ChoiceDelta>,
}

#[derive(Debug, Deserialize)]
struct ChoiceDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

impl From<StreamChunk> for StreamDelta {
    fn from(chunk: StreamChunk) -> Self {
        let delta = chunk.choices.into_iter().next().and_then(|c| c.delta);
        let (reasoning, content) = match delta {
            Some(d) => (
                non_empty(d.reasoning_content).or_else(|| non_empty(d.reasoning)),
                non_empty(d.content),
            ),
            None => (None, None),
        };

        StreamDelta {
            reasoning,
            content,
            usage: chunk.usage,
        }
    }
}

/// Decode a single line. `None` for anything that is not a usable event.
pub fn decode_line(line: &str) -> Option<SseEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();

    if payload == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => Some(SseEvent::Delta(chunk.into())),
        Err(e) => {
            debug!("Skipping unparseable SSE line: {}", e);
            None
        }
    }
}

/// Incremental decoder over raw body chunks.
///
/// Bytes are buffered until a newline so that lines and multi-byte
/// characters split across network chunks decode intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen. Further input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append `bytes` and return every event from the complete lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..pos]);
            if self.push_line(&line, &mut events) {
                break;
            }
        }
        events
    }

    /// Decode whatever is left after the body ends without a newline.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            self.push_line(&line, &mut events);
        }
        events
    }

    /// Returns true once the stream is finished.
    fn push_line(&mut self, line: &str, events: &mut Vec<SseEvent>) -> bool {
        match decode_line(line) {
            Some(SseEvent::Done) => {
                self.done = true;
                self.buffer.clear();
                events.push(SseEvent::Done);
                true
            }
            Some(event) => {
                events.push(event);
                false
            }
            None => false,
        }
    }
}
