//! Game state machine: Off / Attention / Meditation.
//!
//! The one deliberately blocking corner of the crate. State changes are rare
//! (a button press or the single startup entry), so the transition writes the
//! RGB color and plays the state's tone sequence synchronously — under 1.5 s
//! end to end — before the main loop resumes.

use log::info;

use crate::hal::{Board, Level, OutputId};
use crate::types::{ColorRgb, ToneStep};

// ── States ────────────────────────────────────────────────────────────────────

/// The game states, cycled by the toggle button in declaration order.
///
/// Extend the game by adding a variant plus a row in [`GameState::spec`];
/// everything else (`COUNT`, `from_count`, the toggle cycle) follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Blaster idle: LEDs dark, no magnitude, no firing.
    Off,
    /// Attention play: magnitude tracks the eSense attention value.
    Attention,
    /// Meditation play: magnitude tracks the eSense meditation value.
    Meditation,
}

/// Everything a state needs when entered: a label, a digital RGB color, and
/// a tone sequence announcing the transition.
#[derive(Debug, Clone, Copy)]
pub struct StateSpec {
    pub name: &'static str,
    pub color: ColorRgb,
    pub tones: &'static [ToneStep],
}

const OFF_TONES: [ToneStep; 2] = [
    ToneStep::new(392, 250, 50),
    ToneStep::new(262, 350, 0),
];

const ATTENTION_TONES: [ToneStep; 3] = [
    ToneStep::new(523, 150, 30),
    ToneStep::new(659, 150, 30),
    ToneStep::new(784, 250, 0),
];

const MEDITATION_TONES: [ToneStep; 2] = [
    ToneStep::new(330, 300, 80),
    ToneStep::new(392, 400, 0),
];

const OFF_SPEC: StateSpec = StateSpec {
    name: "off",
    color: ColorRgb::OFF,
    tones: &OFF_TONES,
};

const ATTENTION_SPEC: StateSpec = StateSpec {
    name: "attention",
    color: ColorRgb::new(Level::High, Level::Low, Level::Low),
    tones: &ATTENTION_TONES,
};

const MEDITATION_SPEC: StateSpec = StateSpec {
    name: "meditation",
    color: ColorRgb::new(Level::Low, Level::Low, Level::High),
    tones: &MEDITATION_TONES,
};

impl GameState {
    /// Number of states in the cycle.
    pub const COUNT: u32 = 3;

    /// State index, `0..COUNT`.
    pub fn index(self) -> u32 {
        match self {
            GameState::Off => 0,
            GameState::Attention => 1,
            GameState::Meditation => 2,
        }
    }

    /// State selected by a toggle count: `count mod COUNT`.
    pub fn from_count(count: u32) -> GameState {
        match count % Self::COUNT {
            0 => GameState::Off,
            1 => GameState::Attention,
            _ => GameState::Meditation,
        }
    }

    /// The state's color and tone sequence.
    pub fn spec(self) -> &'static StateSpec {
        match self {
            GameState::Off => &OFF_SPEC,
            GameState::Attention => &ATTENTION_SPEC,
            GameState::Meditation => &MEDITATION_SPEC,
        }
    }
}

// ── Machine ───────────────────────────────────────────────────────────────────

/// Cycles through the game states on toggle events.
///
/// The toggle counter is a plain wrapping `u32` normalised modulo
/// [`GameState::COUNT`] at lookup time, so it can increment without bound.
#[derive(Debug, Default)]
pub struct GameStateMachine {
    toggle_count: u32,
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state selected by the current toggle count.
    pub fn current(&self) -> GameState {
        GameState::from_count(self.toggle_count)
    }

    pub fn toggle_count(&self) -> u32 {
        self.toggle_count
    }

    /// Apply the current state's outputs without advancing: writes the RGB
    /// channels and plays the tone sequence (blocking). Used once at startup
    /// to enter [`GameState::Off`].
    pub fn enter_current<B: Board + ?Sized>(&self, board: &mut B) -> GameState {
        let state = self.current();
        let spec = state.spec();
        info!("game state → {} (toggle count {})", spec.name, self.toggle_count);

        board.set_output(OutputId::RgbRed, spec.color.red);
        board.set_output(OutputId::RgbGreen, spec.color.green);
        board.set_output(OutputId::RgbBlue, spec.color.blue);

        for step in spec.tones {
            board.play_tone(step.frequency_hz, step.duration_ms);
            if step.gap_ms > 0 {
                board.delay_ms(step.gap_ms);
            }
        }
        board.stop_tone();

        state
    }

    /// Advance one step and apply the new state. Returns the state entered.
    pub fn toggle<B: Board + ?Sized>(&mut self, board: &mut B) -> GameState {
        self.toggle_count = self.toggle_count.wrapping_add(1);
        self.enter_current(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;

    #[test]
    fn state_index_is_count_mod_n() {
        for count in 0..20u32 {
            assert_eq!(GameState::from_count(count).index(), count % GameState::COUNT);
        }
        // Stable under repetition and correct near the counter wrap.
        assert_eq!(GameState::from_count(7), GameState::from_count(7));
        assert_eq!(
            GameState::from_count(u32::MAX).index(),
            u32::MAX % GameState::COUNT
        );
    }

    #[test]
    fn toggle_cycles_off_attention_meditation() {
        let (mut board, _handle) = SimBoard::new();
        let mut machine = GameStateMachine::new();
        assert_eq!(machine.current(), GameState::Off);
        assert_eq!(machine.toggle(&mut board), GameState::Attention);
        assert_eq!(machine.toggle(&mut board), GameState::Meditation);
        assert_eq!(machine.toggle(&mut board), GameState::Off);
    }

    #[test]
    fn entering_a_state_writes_color_and_tones() {
        let (mut board, handle) = SimBoard::new();
        let mut machine = GameStateMachine::new();

        machine.toggle(&mut board); // → Attention
        assert_eq!(handle.output(OutputId::RgbRed), Level::High);
        assert_eq!(handle.output(OutputId::RgbGreen), Level::Low);
        assert_eq!(handle.output(OutputId::RgbBlue), Level::Low);

        let tones = handle.take_tones();
        assert_eq!(tones.len(), ATTENTION_TONES.len());
        assert_eq!(tones[0], (523, 150));
    }

    #[test]
    fn tone_sequences_finish_within_transition_bound() {
        for state in [GameState::Off, GameState::Attention, GameState::Meditation] {
            let total: u64 = state
                .spec()
                .tones
                .iter()
                .map(|t| t.duration_ms + t.gap_ms)
                .sum();
            assert!(total <= 1_500, "{} tones run {total} ms", state.spec().name);
        }
    }
}
