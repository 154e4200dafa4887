//! Incremental UTF-8 decoding for streamed response bodies.
//!
//! Network chunks can split a multi-byte character; the tail of such a chunk
//! is held back until the next chunk completes it.

use crate::error::{Error, Result};

/// Decodes a byte stream into text fragments one network chunk at a time.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next network chunk.
    ///
    /// Returns the text that is complete so far, or `None` when the chunk
    /// only extended an unfinished character.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<String>> {
        self.pending.extend_from_slice(chunk);

        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(Error::Decode(format!(
                    "invalid UTF-8 in response stream: {e}"
                )));
            }
        };

        if complete == 0 {
            return Ok(None);
        }

        let rest = self.pending.split_off(complete);
        let bytes = std::mem::replace(&mut self.pending, rest);
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::Decode(e.to_string()))
    }

    /// Signal end of stream. Leftover bytes mean the body ended mid-character.
    pub fn finish(self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(Error::Decode(format!(
                "response stream ended inside a UTF-8 sequence ({} dangling bytes)",
                self.pending.len()
            )))
        }
    }
}
