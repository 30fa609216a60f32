//! Incremental parser for the ThinkGear serial stream.
//!
//! The parser is pure (no I/O): feed it bytes from whatever transport the
//! headset hangs off — a UART, a Bluetooth RFCOMM socket, a recorded capture —
//! and it hands back a [`HeadsetReading`] whenever a checksum-valid packet
//! carrying at least one eSense row completes.
//!
//! # Row walk
//!
//! A payload is a sequence of rows. Codes below 0x80 carry exactly one value
//! byte; codes at or above 0x80 carry an explicit length byte followed by
//! that many payload bytes (raw wave samples, ASIC band powers), which this
//! crate skips — it is a threshold/state demo, not a DSP pipeline. `0x55`
//! EXCODE prefixes are tolerated and ignored.
//!
//! Values for rows absent from a given packet are retained from earlier
//! packets, so a reading always carries a complete (signal, attention,
//! meditation) triple. Before the first poor-signal row arrives the quality
//! defaults to 200 ("not worn") — pessimistic until proven otherwise.

use log::debug;

use crate::hal::HeadsetSource;
use crate::protocol::{
    checksum, CODE_ATTENTION, CODE_MEDITATION, CODE_POOR_SIGNAL, EXCODE, MAX_PAYLOAD_LEN,
    MULTI_BYTE_CODE, SIGNAL_OFF_HEAD, SYNC,
};
use crate::types::HeadsetReading;

// ── Parser ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the first 0xAA.
    Sync1,
    /// Saw one 0xAA, waiting for the second.
    Sync2,
    /// Waiting for the payload length byte.
    Length,
    /// Accumulating payload bytes.
    Payload,
    /// Waiting for the checksum byte.
    Checksum,
}

/// Byte-at-a-time ThinkGear packet assembler.
///
/// # Example
///
/// ```
/// use mindtag::parse::ThinkGearParser;
/// use mindtag::protocol::checksum;
///
/// let payload = [0x02, 26, 0x04, 55, 0x05, 60];
/// let mut frame = vec![0xAA, 0xAA, payload.len() as u8];
/// frame.extend_from_slice(&payload);
/// frame.push(checksum(&payload));
///
/// let mut parser = ThinkGearParser::new();
/// let readings = parser.feed(&frame);
/// assert_eq!(readings.len(), 1);
/// assert_eq!(readings[0].signal_quality, 26);
/// assert_eq!(readings[0].attention, 55);
/// assert_eq!(readings[0].meditation, 60);
/// ```
pub struct ThinkGearParser {
    state: ParseState,
    expected_len: usize,
    payload: Vec<u8>,
    // Retained field values, merged into every emitted reading.
    signal_quality: u8,
    attention: u8,
    meditation: u8,
    /// Readings parsed but not yet handed out via [`HeadsetSource::poll`].
    pending: Vec<HeadsetReading>,
}

impl ThinkGearParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Sync1,
            expected_len: 0,
            payload: Vec::with_capacity(MAX_PAYLOAD_LEN),
            signal_quality: SIGNAL_OFF_HEAD,
            attention: 0,
            meditation: 0,
            pending: Vec::new(),
        }
    }

    /// Feed one byte. Returns a reading when this byte completes a valid
    /// packet containing at least one eSense row.
    pub fn push(&mut self, byte: u8) -> Option<HeadsetReading> {
        match self.state {
            ParseState::Sync1 => {
                if byte == SYNC {
                    self.state = ParseState::Sync2;
                }
                None
            }
            ParseState::Sync2 => {
                self.state = if byte == SYNC {
                    ParseState::Length
                } else {
                    ParseState::Sync1
                };
                None
            }
            ParseState::Length => {
                if byte == SYNC {
                    // Still syncing — a run of 0xAA is legal padding.
                    return None;
                }
                if byte as usize > MAX_PAYLOAD_LEN {
                    debug!("thinkgear: invalid payload length {byte}, re-syncing");
                    self.state = ParseState::Sync1;
                    return None;
                }
                self.expected_len = byte as usize;
                self.payload.clear();
                self.state = if self.expected_len == 0 {
                    ParseState::Checksum
                } else {
                    ParseState::Payload
                };
                None
            }
            ParseState::Payload => {
                self.payload.push(byte);
                if self.payload.len() == self.expected_len {
                    self.state = ParseState::Checksum;
                }
                None
            }
            ParseState::Checksum => {
                self.state = ParseState::Sync1;
                if byte == checksum(&self.payload) {
                    self.parse_payload()
                } else {
                    debug!(
                        "thinkgear: checksum mismatch (got 0x{byte:02x}), dropping {}-byte payload",
                        self.payload.len()
                    );
                    None
                }
            }
        }
    }

    /// Feed a whole slice, collecting every completed reading.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<HeadsetReading> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Walk the rows of a checksum-valid payload.
    fn parse_payload(&mut self) -> Option<HeadsetReading> {
        let mut saw_esense = false;
        let mut i = 0;

        while i < self.payload.len() {
            // Skip EXCODE prefixes.
            while i < self.payload.len() && self.payload[i] == EXCODE {
                i += 1;
            }
            if i >= self.payload.len() {
                break;
            }
            let code = self.payload[i];
            i += 1;

            if code >= MULTI_BYTE_CODE {
                // Length-prefixed row we don't decode: skip over it.
                let Some(&len) = self.payload.get(i) else {
                    debug!("thinkgear: truncated multi-byte row 0x{code:02x}");
                    break;
                };
                i += 1 + len as usize;
                continue;
            }

            let Some(&value) = self.payload.get(i) else {
                debug!("thinkgear: truncated single-byte row 0x{code:02x}");
                break;
            };
            i += 1;

            match code {
                CODE_POOR_SIGNAL => {
                    // The wire value tops out at 200; clamp so comparisons
                    // against SIGNAL_OFF_HEAD stay valid on corrupt input.
                    self.signal_quality = value.min(SIGNAL_OFF_HEAD);
                    saw_esense = true;
                }
                CODE_ATTENTION => {
                    self.attention = value;
                    saw_esense = true;
                }
                CODE_MEDITATION => {
                    self.meditation = value;
                    saw_esense = true;
                }
                other => {
                    debug!("thinkgear: unknown single-byte code 0x{other:02x}");
                }
            }
        }

        saw_esense.then(|| HeadsetReading {
            signal_quality: self.signal_quality,
            attention: self.attention,
            meditation: self.meditation,
        })
    }
}

impl Default for ThinkGearParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Readings parsed out of previously fed bytes are handed out one per poll,
/// oldest first — this lets the parser sit directly behind the controller as
/// its headset source while the transport thread calls [`ThinkGearParser::feed`].
impl HeadsetSource for ThinkGearParser {
    fn poll(&mut self) -> Option<HeadsetReading> {
        // Note: push/feed return readings directly; this queue is only used
        // when the parser itself is the controller's HeadsetSource.
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl ThinkGearParser {
    /// Feed bytes and queue the resulting readings for later
    /// [`HeadsetSource::poll`] calls.
    pub fn feed_queued(&mut self, bytes: &[u8]) {
        let readings = self.feed(bytes);
        self.pending.extend(readings);
    }
}
