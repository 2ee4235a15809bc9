//! Streaming line codec
//!
//! Serial ports and TCP streams deliver NMEA in arbitrary chunks. The codec
//! buffers raw bytes and hands back one complete line at a time, with the
//! `\r\n` terminator removed.

use tracing::warn;

/// Longest line we are prepared to buffer; NMEA allows 82 characters but
/// FLARM devices append `!TAIL` suffixes and some trackers exceed that
const MAX_LINE_LEN: usize = 256;

/// Streaming NMEA line codec
#[derive(Debug)]
pub struct NmeaCodec {
    buffer: Vec<u8>,
}

impl NmeaCodec {
    /// Create a new codec with an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // A peer streaming garbage without newlines must not grow us forever
        if self.buffer.len() > MAX_LINE_LEN * 4 && !self.buffer.contains(&b'\n') {
            warn!(
                "Discarding {} bytes of unterminated NMEA input",
                self.buffer.len() - MAX_LINE_LEN
            );
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Extract the next complete, non-empty line
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let term_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes: Vec<u8> = self.buffer.drain(..=term_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.trim().is_empty() {
                return Some(line.to_string());
            }
        }
    }

    /// Bytes currently buffered without a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for NmeaCodec {
    fn default() -> Self {
        Self::new()
    }
}
