use crate::game::GameState;
use crate::hal::Level;

/// One complete headset update — a snapshot of the three eSense values the
/// ThinkGear chip reports roughly once per second.
///
/// Produced by [`crate::parse::ThinkGearParser`] (or any other
/// [`crate::hal::HeadsetSource`]) and never mutated afterwards; the controller
/// keeps the previous snapshot only to detect a stuck signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadsetReading {
    /// Signal quality, 0–200.
    ///
    /// 0 means a clean contact; higher values mean more noise. The special
    /// value 200 ([`crate::protocol::SIGNAL_OFF_HEAD`]) means the headset is
    /// not being worn at all.
    pub signal_quality: u8,
    /// eSense attention level, 0–100. 0 means "unable to compute".
    pub attention: u8,
    /// eSense meditation level, 0–100. 0 means "unable to compute".
    pub meditation: u8,
}

/// Derived headset link status.
///
/// Recomputed from the latest and previous [`HeadsetReading`] on every update
/// by [`crate::status::classify`]; samples are only collected and shots only
/// fired while the status is [`HeadsetStatus::On`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadsetStatus {
    /// Headset is not being worn (signal quality reads 200).
    Off,
    /// Worn, but the chip cannot compute an attention value yet.
    NoSignal,
    /// Nominally on, but attention and meditation have not moved since the
    /// previous reading — the classic symptom of a frozen serial link.
    Stuck,
    /// Worn with a usable signal.
    On,
}

impl HeadsetStatus {
    /// Short lowercase label for logs and the TUI status line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::NoSignal => "no-signal",
            Self::Stuck => "stuck",
            Self::On => "on",
        }
    }
}

/// Digital RGB color — one HIGH/LOW level per channel, no PWM.
///
/// The status LED on the blaster is a common-cathode RGB part driven from
/// three plain digital outputs, so eight colors are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRgb {
    pub red: Level,
    pub green: Level,
    pub blue: Level,
}

impl ColorRgb {
    pub const OFF: ColorRgb = ColorRgb {
        red: Level::Low,
        green: Level::Low,
        blue: Level::Low,
    };

    pub const fn new(red: Level, green: Level, blue: Level) -> Self {
        Self { red, green, blue }
    }
}

/// One step of a game-state tone sequence.
///
/// Playback is intentionally blocking (state changes are rare, user initiated
/// and under 1.5 s total): the speaker plays `frequency_hz` for `duration_ms`,
/// then stays silent for `gap_ms` before the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneStep {
    pub frequency_hz: u16,
    pub duration_ms: u64,
    pub gap_ms: u64,
}

impl ToneStep {
    pub const fn new(frequency_hz: u16, duration_ms: u64, gap_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration_ms,
            gap_ms,
        }
    }
}

/// Events produced by [`crate::controller::GameController::step`] and
/// forwarded over the mpsc channel by [`crate::controller::GameController::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The game state machine entered a (possibly new) state: either the
    /// one-shot startup entry into [`GameState::Off`] or a toggle-button
    /// transition.
    StateChanged { state: GameState },
    /// The derived headset status changed from the previous reading.
    StatusChanged { status: HeadsetStatus },
    /// A fresh headset reading was accepted, regardless of status.
    Reading(HeadsetReading),
    /// The fire detector accepted a trigger: the IR emitter pulse is underway.
    ///
    /// `magnitude` is the state-selected eSense value that crossed the
    /// threshold; `top_magnitude` is the configured full-scale reference so
    /// consumers can display `magnitude / top_magnitude`.
    ShotFired { magnitude: u8, top_magnitude: u8 },
}
