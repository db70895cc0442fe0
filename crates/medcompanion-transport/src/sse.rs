//! Server-sent event decoding for streaming completions.
//!
//! Only the `data:` field matters to this layer. Events are separated by a
//! blank line; multiple `data:` lines in one event are joined with `\n`.
//! Comment lines (leading `:`) and other fields (`event:`, `id:`, `retry:`)
//! are skipped.

use std::io::BufRead;

use medcompanion_contracts::error::{CompanionError, CompanionResult};

/// Terminal sentinel sent by OpenAI-compatible providers.
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// The joined `data:` payload of one event.
    Data(String),
    /// `data: [DONE]`.
    Done,
}

/// Pulls events off a buffered byte stream one at a time.
pub struct SseReader<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> SseReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }

    /// Read until the next complete event.
    ///
    /// Returns `Ok(None)` at end of stream. A trailing event without a
    /// closing blank line is still returned.
    pub fn next_event(&mut self) -> CompanionResult<Option<SseEvent>> {
        let mut data: Option<String> = None;

        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| CompanionError::Stream {
                    reason: format!("failed to read event stream: {e}"),
                })?;

            if read == 0 {
                return Ok(data.map(Self::classify));
            }

            let line = self.line.trim_end_matches(&['\r', '\n'][..]);

            if line.is_empty() {
                match data.take() {
                    Some(payload) => return Ok(Some(Self::classify(payload))),
                    None => continue,
                }
            }

            if line.starts_with(':') {
                continue;
            }

            if let Some(rest) = line.strip_prefix("data:") {
                let value = rest.strip_prefix(' ').unwrap_or(rest);
                match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                }
            }
        }
    }

    fn classify(payload: String) -> SseEvent {
        if payload.trim() == DONE_SENTINEL {
            SseEvent::Done
        } else {
            SseEvent::Data(payload)
        }
    }
}
