//! Hardware-free board and headset implementations.
//!
//! [`SimBoard`] records every pin write instead of driving silicon, and its
//! paired [`SimHandle`] lets another thread (the demo binary, the TUI, a unit
//! test) press the toggle button and inspect the LEDs while the controller
//! runs. [`ScriptedHeadset`] replays a canned reading sequence;
//! [`SyntheticHeadset`] generates endless plausible eSense values, the same
//! idea as running the TUI with `--simulate` instead of real hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::hal::{Board, HeadsetSource, InputId, Level, OutputId};
use crate::types::HeadsetReading;

// ── Simulated board ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SimState {
    outputs: [Level; OutputId::COUNT],
    intensities: [u8; OutputId::COUNT],
    button: Level,
    /// Tones played, oldest first, as (frequency_hz, duration_ms).
    tones: Vec<(u16, u64)>,
    /// Total blocking time the board was asked to spend, in ms
    /// (tone durations + delay_ms). The simulator never actually sleeps.
    blocked_ms: u64,
}

/// In-memory [`Board`]: every write lands in shared state readable through
/// the matching [`SimHandle`]. Blocking calls return immediately but account
/// their duration in [`SimHandle::blocked_ms`], keeping tests fast.
pub struct SimBoard {
    state: Arc<Mutex<SimState>>,
}

/// Cloneable inspector/driver for a [`SimBoard`].
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimBoard {
    pub fn new() -> (SimBoard, SimHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            SimBoard {
                state: Arc::clone(&state),
            },
            SimHandle { state },
        )
    }
}

impl Board for SimBoard {
    fn set_output(&mut self, output: OutputId, level: Level) {
        self.state.lock().unwrap().outputs[output.index()] = level;
    }

    fn set_intensity(&mut self, output: OutputId, value: u8) {
        self.state.lock().unwrap().intensities[output.index()] = value;
    }

    fn read_input(&mut self, input: InputId) -> Level {
        match input {
            InputId::ToggleButton => self.state.lock().unwrap().button,
        }
    }

    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u64) {
        let mut state = self.state.lock().unwrap();
        state.tones.push((frequency_hz, duration_ms));
        state.blocked_ms += duration_ms;
    }

    fn stop_tone(&mut self) {}

    fn delay_ms(&mut self, ms: u64) {
        self.state.lock().unwrap().blocked_ms += ms;
    }
}

impl SimHandle {
    /// Current level of a digital output.
    pub fn output(&self, output: OutputId) -> Level {
        self.state.lock().unwrap().outputs[output.index()]
    }

    /// Current 8-bit value of an analog output.
    pub fn intensity(&self, output: OutputId) -> u8 {
        self.state.lock().unwrap().intensities[output.index()]
    }

    pub fn press_button(&self) {
        self.state.lock().unwrap().button = Level::High;
    }

    pub fn release_button(&self) {
        self.state.lock().unwrap().button = Level::Low;
    }

    /// Drain the recorded tone log.
    pub fn take_tones(&self) -> Vec<(u16, u64)> {
        std::mem::take(&mut self.state.lock().unwrap().tones)
    }

    /// Total time the board was asked to block, in ms.
    pub fn blocked_ms(&self) -> u64 {
        self.state.lock().unwrap().blocked_ms
    }
}

// ── Scripted headset ──────────────────────────────────────────────────────────

/// Replays a fixed sequence of readings, one every `poll_interval` polls.
///
/// With the controller stepping at ~60 Hz, an interval of 12 approximates the
/// real headset's ~1 Hz eSense cadence compressed five-fold for demos.
pub struct ScriptedHeadset {
    readings: VecDeque<HeadsetReading>,
    poll_interval: u32,
    polls: u32,
}

impl ScriptedHeadset {
    pub fn new(readings: impl IntoIterator<Item = HeadsetReading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            poll_interval: 1,
            polls: 0,
        }
    }

    /// Deliver a reading only every `interval`-th poll (minimum 1).
    pub fn with_poll_interval(mut self, interval: u32) -> Self {
        self.poll_interval = interval.max(1);
        self
    }

    /// Readings not yet delivered.
    pub fn remaining(&self) -> usize {
        self.readings.len()
    }

    /// Append a reading to the end of the script.
    pub fn push(&mut self, reading: HeadsetReading) {
        self.readings.push_back(reading);
    }
}

impl HeadsetSource for ScriptedHeadset {
    fn poll(&mut self) -> Option<HeadsetReading> {
        self.polls += 1;
        if self.polls % self.poll_interval != 0 {
            return None;
        }
        self.readings.pop_front()
    }
}

// ── Synthetic headset ─────────────────────────────────────────────────────────

/// Endless generator of wandering attention/meditation values.
///
/// Attention and meditation follow slow sine waves of different periods, so
/// the magnitude meter sweeps through all three bands and periodically crosses
/// the fire threshold without any hardware attached.
pub struct SyntheticHeadset {
    step: u64,
    poll_interval: u32,
    polls: u32,
}

impl SyntheticHeadset {
    pub fn new(poll_interval: u32) -> Self {
        Self {
            step: 0,
            poll_interval: poll_interval.max(1),
            polls: 0,
        }
    }
}

impl HeadsetSource for SyntheticHeadset {
    fn poll(&mut self) -> Option<HeadsetReading> {
        self.polls += 1;
        if self.polls % self.poll_interval != 0 {
            return None;
        }
        self.step += 1;
        let t = self.step as f64;
        let attention = 50.0 + 48.0 * (t * 0.11).sin();
        let meditation = 50.0 + 40.0 * (t * 0.07 + 1.3).sin();
        Some(HeadsetReading {
            signal_quality: 0,
            attention: attention.round().clamp(1.0, 99.0) as u8,
            meditation: meditation.round().clamp(1.0, 99.0) as u8,
        })
    }
}
