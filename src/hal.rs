//! Hardware seams: the board, clock and headset collaborator traits.
//!
//! Everything timing- or pin-shaped the control core touches goes through one
//! of these traits, so the whole game loop runs unchanged against real GPIO,
//! the [`crate::sim`] simulator, or a unit test.

use std::time::Instant;

use crate::types::HeadsetReading;

// ── Pin identities ────────────────────────────────────────────────────────────

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// Every output the blaster drives. Using a closed enum makes an invalid
/// output identity unrepresentable rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputId {
    /// Infrared "shot" emitter, pulsed 500 ms per accepted fire.
    IrEmitter,
    /// Signal-quality LED: pulse length encodes the headset status.
    QualityLed,
    /// RGB state LED, red channel (digital).
    RgbRed,
    /// RGB state LED, green channel (digital).
    RgbGreen,
    /// RGB state LED, blue channel (digital).
    RgbBlue,
    /// Magnitude meter, low band [0, 32] (analog 0–255).
    MeterLow,
    /// Magnitude meter, mid band [33, 65] (analog 0–255).
    MeterMid,
    /// Magnitude meter, high band [66, 99] (analog 0–255).
    MeterHigh,
}

impl OutputId {
    pub const COUNT: usize = 8;

    /// All outputs, in index order.
    pub const ALL: [OutputId; Self::COUNT] = [
        OutputId::IrEmitter,
        OutputId::QualityLed,
        OutputId::RgbRed,
        OutputId::RgbGreen,
        OutputId::RgbBlue,
        OutputId::MeterLow,
        OutputId::MeterMid,
        OutputId::MeterHigh,
    ];

    /// Stable dense index, used by the pulse scheduler and the simulator.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Every input the blaster reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputId {
    /// Momentary push button that advances the game state.
    ToggleButton,
}

// ── Board ─────────────────────────────────────────────────────────────────────

/// Pin-level I/O plus tone generation.
///
/// `play_tone` and `delay_ms` are the only blocking operations and are called
/// exclusively from the game state machine's tone playback and the optional
/// startup self-test — never from the fire-detection hot path.
pub trait Board {
    /// Drive a digital output HIGH or LOW.
    fn set_output(&mut self, output: OutputId, level: Level);

    /// Drive an analog (PWM) output with an 8-bit intensity.
    fn set_intensity(&mut self, output: OutputId, value: u8);

    /// Sample a digital input.
    fn read_input(&mut self, input: InputId) -> Level;

    /// Play a square-wave tone on the speaker, blocking for `duration_ms`.
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u64);

    /// Silence the speaker.
    fn stop_tone(&mut self);

    /// Blocking wait. Used for tone gaps and self-test blinks only.
    fn delay_ms(&mut self, ms: u64);
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Monotonic millisecond counter.
///
/// Real microcontroller clocks wrap at ~49 days; all timer arithmetic in the
/// crate therefore compares via `now.wrapping_sub(then)` rather than absolute
/// deadlines, which stays correct across a wrap.
pub trait Clock {
    /// Milliseconds since some fixed epoch (boot).
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by [`std::time::Instant`]; never wraps in practice.
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

// ── Headset ───────────────────────────────────────────────────────────────────

/// Source of headset updates.
///
/// Collapses the classic `update() -> bool` / `readSignalQuality()` /
/// `readAttention()` / `readMeditation()` collaborator contract into a single
/// non-blocking snapshot call: `poll` returns `Some` exactly when a new
/// reading became available since the last call.
///
/// Implementations: [`crate::parse::ThinkGearParser`] fed from a serial byte
/// stream, or the scripted/synthetic sources in [`crate::sim`].
pub trait HeadsetSource {
    fn poll(&mut self) -> Option<HeadsetReading>;
}
