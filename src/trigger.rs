//! Magnitude band mapping and the fire/trigger detector.
//!
//! The magnitude (the state-selected eSense value, 0–99) drives a three-band
//! intensity meter; the high band doubles as the trigger: when its mapped
//! intensity reaches the threshold while the headset is on and the cooldown
//! has lapsed, a shot is fired. The cooldown (600 ms) is strictly longer than
//! the IR pulse (500 ms) so the emitter always completes one pulse before the
//! next can start.

use crate::types::HeadsetStatus;

// ── Bands ─────────────────────────────────────────────────────────────────────

/// The three magnitude-meter bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Magnitudes 0–32.
    Low,
    /// Magnitudes 33–65.
    Mid,
    /// Magnitudes 66–99.
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Low, Band::Mid, Band::High];

    /// Inclusive magnitude range covered by this band.
    pub const fn range(self) -> (u8, u8) {
        match self {
            Band::Low => (0, 32),
            Band::Mid => (33, 65),
            Band::High => (66, 99),
        }
    }
}

/// Map a magnitude onto one band's 0–255 output intensity.
///
/// Below the band the intensity is 0, above it 255, and within it the value
/// is rescaled linearly — the classic Arduino `map(value, lo, hi, 0, 255)`
/// with clamping.
///
/// ```
/// use mindtag::trigger::{band_intensity, Band};
///
/// assert_eq!(band_intensity(0, Band::Low), 0);
/// assert_eq!(band_intensity(32, Band::Low), 255);
/// assert_eq!(band_intensity(40, Band::Low), 255);   // above the band
/// assert_eq!(band_intensity(40, Band::High), 0);    // below the band
/// assert_eq!(band_intensity(99, Band::High), 255);
/// ```
pub fn band_intensity(magnitude: u8, band: Band) -> u8 {
    let (lo, hi) = band.range();
    if magnitude < lo {
        0
    } else if magnitude >= hi {
        255
    } else {
        ((magnitude - lo) as u16 * 255 / (hi - lo) as u16) as u8
    }
}

// ── Fire detector ─────────────────────────────────────────────────────────────

/// Default high-band intensity (out of 255) required to fire.
pub const DEFAULT_FIRE_THRESHOLD: u8 = 100;

/// Default minimum time between accepted fires. Strictly longer than the
/// 500 ms IR pulse.
pub const DEFAULT_COOLDOWN_MS: u64 = 600;

/// Threshold + cooldown gate for the IR emitter.
///
/// A rejected attempt — wrong status, intensity below threshold, or still in
/// cooldown — is silently dropped, never queued.
#[derive(Debug)]
pub struct FireDetector {
    threshold: u8,
    cooldown_ms: u64,
    last_fire_at: Option<u64>,
}

impl FireDetector {
    pub fn new(threshold: u8, cooldown_ms: u64) -> Self {
        Self {
            threshold,
            cooldown_ms,
            last_fire_at: None,
        }
    }

    /// Whether a fire at `now` would be rejected purely on cooldown grounds.
    pub fn in_cooldown(&self, now: u64) -> bool {
        self.last_fire_at
            .is_some_and(|last| now.wrapping_sub(last) < self.cooldown_ms)
    }

    /// Evaluate the trigger rule for the current magnitude. Returns `true`
    /// when a shot is accepted, in which case the cooldown window restarts
    /// at `now` and the caller arms the IR pulse.
    pub fn check(&mut self, magnitude: u8, status: HeadsetStatus, now: u64) -> bool {
        if status != HeadsetStatus::On {
            return false;
        }
        if band_intensity(magnitude, Band::High) < self.threshold {
            return false;
        }
        if self.in_cooldown(now) {
            return false;
        }
        self.last_fire_at = Some(now);
        true
    }
}

impl Default for FireDetector {
    fn default() -> Self {
        Self::new(DEFAULT_FIRE_THRESHOLD, DEFAULT_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_mapping_endpoints() {
        assert_eq!(band_intensity(0, Band::Low), 0);
        assert_eq!(band_intensity(32, Band::Low), 255);
        assert_eq!(band_intensity(33, Band::Mid), 0);
        assert_eq!(band_intensity(65, Band::Mid), 255);
        assert_eq!(band_intensity(66, Band::High), 0);
        assert_eq!(band_intensity(99, Band::High), 255);
    }

    #[test]
    fn band_mapping_clamps_outside_range() {
        assert_eq!(band_intensity(80, Band::Low), 255);
        assert_eq!(band_intensity(10, Band::Mid), 0);
        assert_eq!(band_intensity(10, Band::High), 0);
        // Values past the configured top still saturate.
        assert_eq!(band_intensity(100, Band::High), 255);
    }

    #[test]
    fn fires_once_within_cooldown_window() {
        let mut detector = FireDetector::default();
        // magnitude 95 → high-band intensity well past the default threshold
        assert!(detector.check(95, HeadsetStatus::On, 1_000));
        assert!(
            !detector.check(95, HeadsetStatus::On, 1_599),
            "second crossing 599 ms later must be rejected"
        );
        assert!(
            detector.check(95, HeadsetStatus::On, 1_600),
            "crossing at exactly the cooldown boundary is accepted"
        );
    }

    #[test]
    fn requires_headset_on() {
        let mut detector = FireDetector::default();
        assert!(!detector.check(95, HeadsetStatus::Off, 0));
        assert!(!detector.check(95, HeadsetStatus::NoSignal, 0));
        assert!(!detector.check(95, HeadsetStatus::Stuck, 0));
        assert!(detector.check(95, HeadsetStatus::On, 0));
    }

    #[test]
    fn requires_threshold_intensity() {
        let mut detector = FireDetector::default();
        // magnitude 70 → (70-66)*255/33 = 30, below the default threshold
        assert!(!detector.check(70, HeadsetStatus::On, 0));
        // magnitude 79 → (79-66)*255/33 = 100, first magnitude at threshold
        assert!(detector.check(79, HeadsetStatus::On, 0));
    }

    #[test]
    fn rejected_attempts_do_not_restart_cooldown() {
        let mut detector = FireDetector::default();
        assert!(detector.check(95, HeadsetStatus::On, 0));
        // Rejected attempt mid-cooldown...
        assert!(!detector.check(95, HeadsetStatus::On, 300));
        // ...must not push the next acceptance past the original window.
        assert!(detector.check(95, HeadsetStatus::On, 600));
    }
}
