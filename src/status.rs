//! Headset status classification.
//!
//! A pure function of the current reading, the previous reading and the
//! previous status — no I/O here. The controller turns the result into a
//! quality-LED pulse via the [`crate::pulse::PulseScheduler`].

use crate::protocol::SIGNAL_OFF_HEAD;
use crate::types::{HeadsetReading, HeadsetStatus};

// ── Quality-LED encoding ──────────────────────────────────────────────────────

/// Quality-LED pulse length when the headset is not worn.
pub const PULSE_OFF_MS: u64 = 800;
/// Quality-LED pulse length when worn but attention is not computable.
pub const PULSE_NO_SIGNAL_MS: u64 = 600;
/// Quality-LED pulse length when the signal looks frozen.
pub const PULSE_STUCK_MS: u64 = 500;

/// Derive the headset status from the latest reading.
///
/// | Condition | Status |
/// |---|---|
/// | signal quality == 200 | `Off` |
/// | attention == 0 | `NoSignal` |
/// | previous status `On`, attention and meditation unchanged | `Stuck` |
/// | otherwise | `On` |
pub fn classify(
    current: &HeadsetReading,
    previous: Option<&HeadsetReading>,
    previous_status: HeadsetStatus,
) -> HeadsetStatus {
    if current.signal_quality == SIGNAL_OFF_HEAD {
        return HeadsetStatus::Off;
    }
    if current.attention == 0 {
        return HeadsetStatus::NoSignal;
    }
    if previous_status == HeadsetStatus::On {
        if let Some(prev) = previous {
            if prev.attention == current.attention && prev.meditation == current.meditation {
                return HeadsetStatus::Stuck;
            }
        }
    }
    HeadsetStatus::On
}

/// Pulse length that encodes `status` on the quality LED, or `None` for
/// [`HeadsetStatus::On`], which holds the LED steady HIGH instead.
pub fn quality_pulse_ms(status: HeadsetStatus) -> Option<u64> {
    match status {
        HeadsetStatus::Off => Some(PULSE_OFF_MS),
        HeadsetStatus::NoSignal => Some(PULSE_NO_SIGNAL_MS),
        HeadsetStatus::Stuck => Some(PULSE_STUCK_MS),
        HeadsetStatus::On => None,
    }
}
