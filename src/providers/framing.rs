//! Framing for streamed HTTP bodies
//!
//! Streamed replies arrive as arbitrary byte chunks. Gemini uses SSE
//! (`data:` events separated by blank lines) and Ollama uses newline
//! delimited JSON. Both are handled by buffering bytes until a delimiter is
//! seen, so multi-byte characters split across chunks decode correctly.

use crate::error::{MentorError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// Splits a byte stream into frames on a fixed delimiter
#[derive(Debug)]
pub struct DelimitedDecoder {
    delimiter: &'static [u8],
    buffer: Vec<u8>,
}

impl DelimitedDecoder {
    pub fn new(delimiter: &'static [u8]) -> Self {
        Self {
            delimiter,
            buffer: Vec::new(),
        }
    }

    /// Decoder for SSE event blocks
    pub fn sse() -> Self {
        Self::new(b"\n\n")
    }

    /// Decoder for newline delimited JSON
    pub fn lines() -> Self {
        Self::new(b"\n")
    }

    /// Feed a chunk and return every frame it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // CRLF line endings are normalized so one delimiter covers both.
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(pos) = find(&self.buffer, self.delimiter) {
            let frame: Vec<u8> = self.buffer.drain(..pos + self.delimiter.len()).collect();
            let frame = &frame[..pos];
            if !frame.is_empty() {
                frames.push(String::from_utf8_lossy(frame).into_owned());
            }
        }
        frames
    }

    /// Flush any trailing partial frame once the body ends
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            self.buffer.clear();
            return None;
        }
        let frame = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(frame)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Extract the joined `data:` payload of one SSE event block
///
/// Comment lines, `event:`, `id:` and `retry:` fields are ignored. Returns
/// `None` for blocks without data and for `[DONE]` terminators.
pub fn sse_event_data(block: &str) -> Option<String> {
    let data: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    if data.is_empty() {
        return None;
    }

    let joined = data.join("\n");
    if joined.trim().is_empty() || joined.trim() == "[DONE]" {
        return None;
    }
    Some(joined)
}

/// Turn an HTTP body into a stream of decoded frames
///
/// A transport error mid-body is yielded once and ends the stream.
pub fn frame_stream<S>(body: S, decoder: DelimitedDecoder) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = (Box::pin(body), decoder, VecDeque::<String>::new(), false);
    futures::stream::unfold(
        state,
        |(mut body, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(frame) = pending.pop_front() {
                    return Some((Ok(frame), (body, decoder, pending, done)));
                }
                if done {
                    return None;
                }
                match body.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        done = true;
                        tracing::error!("Stream interrupted: {}", e);
                        let err = MentorError::Transport(format!("Stream interrupted: {}", e));
                        return Some((Err(err.into()), (body, decoder, pending, done)));
                    }
                    None => {
                        done = true;
                        pending.extend(decoder.finish());
                    }
                }
            }
        },
    )
}
