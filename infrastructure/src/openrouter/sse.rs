//! Server-sent event decoding for streamed chat completions.
//!
//! The upstream sends one `data: <json>` line per event. `data: [DONE]` ends
//! the stream. Bytes arrive in arbitrary chunks, so lines (and UTF-8
//! sequences) may be split across reads.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A decoded event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Non-empty text from `choices[0].delta.content`
    Delta(String),
    /// The `[DONE]` sentinel
    Done,
    /// An `{"error": ...}` payload sent mid-stream
    UpstreamError(String),
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Incremental line splitter and parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the frames of every completed line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(frame) = parse_line(&String::from_utf8_lossy(&line)) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Parse whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }
}

/// Parse one line. Blank lines, comments and unparsable payloads yield nothing.
pub fn parse_line(line: &str) -> Option<SseFrame> {
    let payload = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim_start();

    if payload == "[DONE]" {
        return Some(SseFrame::Done);
    }

    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("Skipping malformed stream line: {}", e);
            return None;
        }
    };

    if let Some(error) = chunk.error {
        return Some(SseFrame::UpstreamError(error_message(&error)));
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty())
        .map(SseFrame::Delta)
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}
