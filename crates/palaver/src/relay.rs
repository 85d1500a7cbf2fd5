//! Re-streams an already-complete response text as a paced chunk sequence.
//!
//! The upstream endpoints answer with one JSON document, but clients render
//! a typing cadence, so the relay slices the extracted text into small
//! fixed-size pieces and spaces them out. The pacing is a smoothing layer
//! only: concatenating the chunks in emission order always reconstructs the
//! text exactly, whatever size and delay are configured.

use std::time::Duration;

use async_stream::stream;
use bytes::Bytes;
use futures::stream::BoxStream;

#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Chunk size in characters, not bytes. Chunks never split a character.
    pub chunk_chars: usize,
    /// Delay between consecutive chunks. No delay after the final chunk.
    pub delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            chunk_chars: 3,
            delay: Duration::from_millis(30),
        }
    }
}

/// Slice `text` into chunks on character boundaries and yield them with the
/// configured inter-chunk delay. The stream closes exactly once, after the
/// final chunk (immediately, for empty text).
pub fn paced_chunks(text: String, pacing: Pacing) -> BoxStream<'static, Bytes> {
    let chunks = chunk_text(&text, pacing.chunk_chars);

    Box::pin(stream! {
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.into_iter().enumerate() {
            yield Bytes::from(chunk);
            if i < last {
                tokio::time::sleep(pacing.delay).await;
            }
        }
    })
}

fn chunk_text(text: &str, chunk_chars: usize) -> Vec<String> {
    let size = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
