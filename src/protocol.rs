//! ThinkGear serial wire-format constants and helpers.
//!
//! NeuroSky headsets (MindWave, MindFlex and friends) stream a simple framed
//! byte protocol over their serial link:
//!
//! ```text
//! [0xAA] [0xAA] [plength] [payload × plength] [checksum]
//! ```
//!
//! `plength` must be < 170 (a byte of 0xAA in the length position is treated
//! as more sync), and the checksum is the bitwise inverse of the low byte of
//! the payload sum. The payload itself is a sequence of rows; see
//! [`crate::parse::ThinkGearParser`] for the row walk.

// ── Framing ──────────────────────────────────────────────────────────────────

/// Frame synchronisation byte; two in a row start a packet.
pub const SYNC: u8 = 0xAA;

/// Largest legal payload length. 170 (= [`SYNC`]) and above is invalid and
/// forces a re-sync.
pub const MAX_PAYLOAD_LEN: usize = 169;

// ── Row codes ────────────────────────────────────────────────────────────────

/// Extended-code prefix. No extended code levels are defined for shipping
/// headsets, so parsers skip these bytes.
pub const EXCODE: u8 = 0x55;

/// Single-byte row: poor-signal quality, 0–200 (200 = electrodes off the skin).
pub const CODE_POOR_SIGNAL: u8 = 0x02;

/// Single-byte row: eSense attention, 0–100.
pub const CODE_ATTENTION: u8 = 0x04;

/// Single-byte row: eSense meditation, 0–100.
pub const CODE_MEDITATION: u8 = 0x05;

/// Multi-byte row: one raw 16-bit wave sample (512 Hz). Skipped.
pub const CODE_RAW_WAVE: u8 = 0x80;

/// Multi-byte row: eight 24-bit ASIC EEG band powers. Skipped.
pub const CODE_ASIC_EEG_POWER: u8 = 0x83;

/// Codes at or above this value carry an explicit length byte before their
/// payload; codes below it carry exactly one value byte.
pub const MULTI_BYTE_CODE: u8 = 0x80;

// ── Field semantics ──────────────────────────────────────────────────────────

/// Poor-signal value meaning "headset is not being worn".
pub const SIGNAL_OFF_HEAD: u8 = 200;

// ── Checksum ─────────────────────────────────────────────────────────────────

/// Compute the ThinkGear payload checksum: sum the payload bytes, keep the
/// low 8 bits, invert.
///
/// # Example
///
/// ```
/// # use mindtag::protocol::checksum;
/// // attention=55 row on its own
/// assert_eq!(checksum(&[0x04, 55]), !(0x04u8.wrapping_add(55)));
/// ```
pub fn checksum(payload: &[u8]) -> u8 {
    !payload
        .iter()
        .fold(0u8, |acc, &byte| acc.wrapping_add(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_hand_computed_frame() {
        // 0x02 + 26 + 0x04 + 55 + 0x05 + 60 = 152 → !152 = 103
        let payload = [CODE_POOR_SIGNAL, 26, CODE_ATTENTION, 55, CODE_MEDITATION, 60];
        assert_eq!(checksum(&payload), 103);
    }

    #[test]
    fn checksum_wraps_past_255() {
        let payload = [0xFF, 0xFF, 0x03];
        // 0xFF + 0xFF + 0x03 = 0x201 → low byte 0x01 → !0x01 = 0xFE
        assert_eq!(checksum(&payload), 0xFE);
    }
}
