//! The main control loop: one `step` per iteration, no blocking on the hot
//! path.
//!
//! Each step polls the toggle button, drains the headset source, classifies
//! signal status, feeds the sample ring, updates the magnitude meter, runs the
//! fire detector, and finally ticks the pulse scheduler so completed pulses
//! fall. The async [`GameController::run`] wrapper paces `step` with tokio
//! and forwards the produced [`GameEvent`]s over an mpsc channel.

use anyhow::Result;
use log::{debug, info};
use tokio::sync::mpsc;

use crate::buffer::SampleBuffer;
use crate::game::{GameState, GameStateMachine};
use crate::hal::{Board, Clock, HeadsetSource, InputId, Level, MonotonicClock, OutputId};
use crate::pulse::PulseScheduler;
use crate::status::{classify, quality_pulse_ms};
use crate::trigger::{
    band_intensity, Band, FireDetector, DEFAULT_COOLDOWN_MS, DEFAULT_FIRE_THRESHOLD,
};
use crate::types::{GameEvent, HeadsetReading, HeadsetStatus};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning knobs for [`GameController`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Sample ring capacity. Default: 10.
    pub sample_capacity: usize,
    /// High-band intensity (of 255) required to fire. Default: 100.
    pub fire_threshold: u8,
    /// IR emitter pulse length per accepted shot. Default: 500 ms.
    pub fire_pulse_ms: u64,
    /// Minimum time between accepted shots. Kept strictly longer than
    /// `fire_pulse_ms` so one pulse always completes first. Default: 600 ms.
    pub fire_cooldown_ms: u64,
    /// Full-scale magnitude reference reported with each shot. Default: 99.
    pub top_magnitude: u8,
    /// Toggle-button debounce window. Default: 30 ms.
    pub debounce_ms: u64,
    /// Enter [`GameState::Off`] (color + tone sequence) once at boot.
    /// Default: `true`.
    pub auto_start: bool,
    /// Blink each status LED once at boot as a pin sanity check (bounded
    /// blocking). Default: `false`.
    pub startup_self_test: bool,
    /// Pacing of the async [`GameController::run`] loop. Default: 16 ms
    /// (~60 Hz).
    pub loop_period_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_capacity: SampleBuffer::DEFAULT_CAPACITY,
            fire_threshold: DEFAULT_FIRE_THRESHOLD,
            fire_pulse_ms: 500,
            fire_cooldown_ms: DEFAULT_COOLDOWN_MS,
            top_magnitude: 99,
            debounce_ms: 30,
            auto_start: true,
            startup_self_test: false,
            loop_period_ms: 16,
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Owns the board, the headset source and every game-loop component, so the
/// whole loop state lives in one testable value instead of process globals.
pub struct GameController<B: Board, H: HeadsetSource> {
    config: ControllerConfig,
    board: B,
    headset: H,
    machine: GameStateMachine,
    buffer: SampleBuffer,
    scheduler: PulseScheduler,
    detector: FireDetector,
    status: HeadsetStatus,
    previous: Option<HeadsetReading>,
    /// State-selected eSense value from the most recent usable reading.
    magnitude: u8,
    booted: bool,
    /// Debounce-committed button level.
    button_level: Level,
    /// Raw level last sampled from the pin, and when it last changed.
    raw_level: Level,
    raw_since_ms: u64,
}

impl<B: Board, H: HeadsetSource> GameController<B, H> {
    pub fn new(config: ControllerConfig, board: B, headset: H) -> Self {
        let buffer = SampleBuffer::new(config.sample_capacity);
        let detector = FireDetector::new(config.fire_threshold, config.fire_cooldown_ms);
        Self {
            config,
            board,
            headset,
            machine: GameStateMachine::new(),
            buffer,
            scheduler: PulseScheduler::new(),
            detector,
            status: HeadsetStatus::Off,
            previous: None,
            magnitude: 0,
            booted: false,
            button_level: Level::Low,
            raw_level: Level::Low,
            raw_since_ms: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.machine.current()
    }

    pub fn status(&self) -> HeadsetStatus {
        self.status
    }

    /// Mutable access to the headset source (scripting in tests and demos).
    pub fn headset_mut(&mut self) -> &mut H {
        &mut self.headset
    }

    /// Run one loop iteration at time `now` (milliseconds, monotonic) and
    /// return the events it produced. Never blocks except through the game
    /// state machine's tone playback on a transition.
    pub fn step(&mut self, now: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();

        // One-shot boot work: self-test blinks, then the automatic entry
        // into Off when auto-start is configured.
        if !self.booted {
            self.booted = true;
            if self.config.startup_self_test {
                self.self_test();
            }
            if self.config.auto_start {
                let state = self.machine.enter_current(&mut self.board);
                self.refresh_magnitude();
                events.push(GameEvent::StateChanged { state });
            }
        }

        // Toggle input: debounced rising edge advances the game state.
        if self.poll_toggle_edge(now) {
            let state = self.machine.toggle(&mut self.board);
            self.refresh_magnitude();
            events.push(GameEvent::StateChanged { state });
        }

        // Headset update: classify, drive the quality LED, collect a sample.
        if let Some(reading) = self.headset.poll() {
            self.on_reading(reading, now, &mut events);
        }

        // Magnitude meter + fire detection.
        for band in Band::ALL {
            let output = match band {
                Band::Low => OutputId::MeterLow,
                Band::Mid => OutputId::MeterMid,
                Band::High => OutputId::MeterHigh,
            };
            self.board
                .set_intensity(output, band_intensity(self.magnitude, band));
        }
        if self.detector.check(self.magnitude, self.status, now) {
            self.scheduler.pulse(
                &mut self.board,
                OutputId::IrEmitter,
                now,
                self.config.fire_pulse_ms,
            );
            info!(
                "shot fired: magnitude {}/{}",
                self.magnitude, self.config.top_magnitude
            );
            events.push(GameEvent::ShotFired {
                magnitude: self.magnitude,
                top_magnitude: self.config.top_magnitude,
            });
        }

        // Expire completed pulses. The only way a pulsed output falls.
        self.scheduler.tick(&mut self.board, now);

        events
    }

    /// Settle-then-sample debounce for the toggle button: any raw level
    /// change restarts the window, and the level is committed only once it
    /// has held steady for `debounce_ms` — a bounce inside the window delays
    /// a held press rather than losing it. Returns `true` on a committed
    /// rising edge.
    fn poll_toggle_edge(&mut self, now: u64) -> bool {
        let level = self.board.read_input(InputId::ToggleButton);
        if level != self.raw_level {
            self.raw_level = level;
            self.raw_since_ms = now;
            return false;
        }
        if level == self.button_level {
            return false;
        }
        if now.wrapping_sub(self.raw_since_ms) < self.config.debounce_ms {
            return false;
        }
        self.button_level = level;
        level == Level::High
    }

    fn on_reading(&mut self, reading: HeadsetReading, now: u64, events: &mut Vec<GameEvent>) {
        let status = classify(&reading, self.previous.as_ref(), self.status);
        if status != self.status {
            info!("headset status → {}", status.as_str());
            events.push(GameEvent::StatusChanged { status });
        }

        // Quality LED: pulse length encodes the degraded statuses; a healthy
        // link holds the LED steady HIGH.
        match quality_pulse_ms(status) {
            Some(duration_ms) => {
                self.scheduler
                    .pulse(&mut self.board, OutputId::QualityLed, now, duration_ms)
            }
            None => self
                .scheduler
                .set_steady(&mut self.board, OutputId::QualityLed, Level::High),
        }

        self.previous = Some(reading);
        self.status = status;
        self.refresh_magnitude();
        if status == HeadsetStatus::On && self.buffer.collect(self.magnitude) {
            debug!("sample window complete: {:?}", self.buffer.snapshot());
        }
        events.push(GameEvent::Reading(reading));
    }

    /// Recompute the state-selected magnitude from the retained reading.
    /// Called on every reading and on every state change — readings arrive at
    /// ~1 Hz while the loop runs much faster, so without the state-change
    /// refresh a toggle would leave the previous state's eSense value driving
    /// the meter and the fire detector until the next reading.
    fn refresh_magnitude(&mut self) {
        self.magnitude = if self.status == HeadsetStatus::On {
            match self.machine.current() {
                GameState::Off => 0,
                GameState::Attention => self.previous.map_or(0, |r| r.attention),
                GameState::Meditation => self.previous.map_or(0, |r| r.meditation),
            }
        } else {
            0
        };
    }

    /// Blink each digital status LED once. Bounded blocking, boot only.
    fn self_test(&mut self) {
        for output in [
            OutputId::QualityLed,
            OutputId::RgbRed,
            OutputId::RgbGreen,
            OutputId::RgbBlue,
        ] {
            self.board.set_output(output, Level::High);
            self.board.delay_ms(100);
            self.board.set_output(output, Level::Low);
        }
    }

    /// Drive the loop forever at the configured period, forwarding events to
    /// `tx`. Returns once the receiver is dropped.
    pub async fn run(mut self, tx: mpsc::Sender<GameEvent>) -> Result<()> {
        let clock = MonotonicClock::new();
        let period = std::time::Duration::from_millis(self.config.loop_period_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        info!(
            "control loop starting: period {} ms, auto_start={}",
            self.config.loop_period_ms, self.config.auto_start
        );

        loop {
            ticker.tick().await;
            for event in self.step(clock.now_ms()) {
                if tx.send(event).await.is_err() {
                    info!("event receiver dropped — control loop stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedHeadset, SimBoard, SimHandle};

    fn reading(signal_quality: u8, attention: u8, meditation: u8) -> HeadsetReading {
        HeadsetReading {
            signal_quality,
            attention,
            meditation,
        }
    }

    fn controller_with(
        config: ControllerConfig,
    ) -> (GameController<SimBoard, ScriptedHeadset>, SimHandle) {
        let (board, handle) = SimBoard::new();
        let headset = ScriptedHeadset::new([]);
        (GameController::new(config, board, headset), handle)
    }

    /// Tap the button: press, let the settle window elapse so the edge
    /// commits, then release and let the release settle too. Returns the
    /// events from the step that registered the press.
    fn tap_button(
        controller: &mut GameController<SimBoard, ScriptedHeadset>,
        handle: &SimHandle,
        now: u64,
    ) -> Vec<GameEvent> {
        handle.press_button();
        controller.step(now);
        let events = controller.step(now + 50);
        handle.release_button();
        controller.step(now + 100);
        controller.step(now + 150);
        events
    }

    #[test]
    fn boot_auto_start_enters_off_once() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        let events = controller.step(0);
        assert_eq!(
            events,
            vec![GameEvent::StateChanged {
                state: GameState::Off
            }]
        );
        // Off plays its announcement tones but keeps the RGB LED dark.
        assert_eq!(handle.take_tones().len(), 2);
        assert_eq!(handle.output(OutputId::RgbRed), Level::Low);

        assert!(controller.step(16).is_empty(), "boot entry happens once");
    }

    #[test]
    fn three_toggles_cycle_back_to_off() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0); // boot → Off
        handle.take_tones();

        let mut states = Vec::new();
        for n in 1..=3u64 {
            let events = tap_button(&mut controller, &handle, n * 1_000);
            assert_eq!(events.len(), 1, "expected exactly one event, got {events:?}");
            let GameEvent::StateChanged { state } = events[0] else {
                panic!("expected StateChanged, got {events:?}");
            };
            states.push(state);
            assert!(
                !handle.take_tones().is_empty(),
                "each transition plays one tone sequence"
            );
        }
        assert_eq!(
            states,
            vec![GameState::Attention, GameState::Meditation, GameState::Off]
        );
        assert_eq!(handle.output(OutputId::RgbRed), Level::Low);
    }

    #[test]
    fn bouncing_edge_settles_before_toggling() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0);

        handle.press_button();
        controller.step(1_000);
        handle.release_button();
        controller.step(1_010); // bounce: level fell inside the settle window
        handle.press_button();
        let events = controller.step(1_020);
        assert!(events.is_empty(), "no toggle until the level settles");
        assert_eq!(controller.state(), GameState::Off);

        // Held steady past the debounce window: the press registers once.
        let events = controller.step(1_055);
        assert_eq!(events.len(), 1);
        assert_eq!(controller.state(), GameState::Attention);
        assert!(
            controller.step(1_071).is_empty(),
            "a held press toggles only once"
        );
    }

    #[test]
    fn reading_drives_status_meter_and_fire() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0); // boot → Off
        tap_button(&mut controller, &handle, 100); // → Attention

        controller.headset_mut().push(reading(0, 95, 40));
        let events = controller.step(300);
        assert!(events.contains(&GameEvent::StatusChanged {
            status: HeadsetStatus::On
        }));
        assert!(events.contains(&GameEvent::Reading(reading(0, 95, 40))));
        assert!(events.contains(&GameEvent::ShotFired {
            magnitude: 95,
            top_magnitude: 99
        }));

        // Meter reflects magnitude 95; quality LED is held steady HIGH.
        assert_eq!(handle.intensity(OutputId::MeterLow), 255);
        assert_eq!(handle.intensity(OutputId::MeterMid), 255);
        assert_eq!(handle.intensity(OutputId::MeterHigh), 224);
        assert_eq!(handle.output(OutputId::QualityLed), Level::High);

        // IR pulse: HIGH through 799 ms, LOW at 800.
        assert_eq!(handle.output(OutputId::IrEmitter), Level::High);
        controller.step(799);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::High);
        controller.step(800);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::Low);
    }

    #[test]
    fn cooldown_rejects_rapid_second_shot() {
        // Two threshold crossings 200 ms apart: only the first fires. A third
        // crossing 600 ms after the first is accepted again.
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0);
        tap_button(&mut controller, &handle, 100);

        controller.headset_mut().push(reading(0, 95, 40));
        let first = controller.step(300);
        assert!(first.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })));

        controller.headset_mut().push(reading(0, 96, 40));
        let second = controller.step(500); // 200 ms later: within cooldown
        assert!(
            !second.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })),
            "shot inside the cooldown window must be dropped"
        );

        controller.headset_mut().push(reading(0, 97, 40));
        let third = controller.step(900); // 600 ms after the first: allowed
        assert!(third.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })));
    }

    #[test]
    fn no_fire_while_state_is_off() {
        let (mut controller, _handle) = controller_with(ControllerConfig::default());
        controller.step(0); // boot → Off, never toggled
        controller.headset_mut().push(reading(0, 95, 95));
        let events = controller.step(100);
        assert!(
            !events.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })),
            "Off state has no magnitude and must not fire"
        );
    }

    #[test]
    fn toggling_away_clears_the_stale_magnitude() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0);
        tap_button(&mut controller, &handle, 100); // → Attention

        controller.headset_mut().push(reading(0, 95, 40));
        let events = controller.step(300);
        assert!(events.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })));

        // No further readings arrive (they come at ~1 Hz): the attention
        // value from the last reading must not keep driving the meter or the
        // fire detector once the state changes.
        tap_button(&mut controller, &handle, 1_000); // → Meditation
        assert_eq!(
            handle.intensity(OutputId::MeterMid),
            55,
            "meter now tracks the retained meditation value (40)"
        );
        assert_eq!(handle.intensity(OutputId::MeterHigh), 0);

        tap_button(&mut controller, &handle, 2_000); // → Off
        let events = controller.step(3_000); // cooldown long since lapsed
        assert_eq!(controller.state(), GameState::Off);
        assert!(
            !events.iter().any(|e| matches!(e, GameEvent::ShotFired { .. })),
            "no shot may fire while the game state is Off"
        );
        assert_eq!(handle.intensity(OutputId::MeterLow), 0);
        assert_eq!(handle.intensity(OutputId::MeterHigh), 0);
    }

    #[test]
    fn degraded_statuses_pulse_quality_led_and_suppress_samples() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0);
        tap_button(&mut controller, &handle, 100);

        // Off-head reading → 800 ms pulse. Note the controller's initial
        // status is already Off, so no StatusChanged is expected here.
        controller.headset_mut().push(reading(200, 50, 50));
        let events = controller.step(300);
        assert!(events.contains(&GameEvent::Reading(reading(200, 50, 50))));
        assert_eq!(controller.status(), HeadsetStatus::Off);
        assert_eq!(handle.output(OutputId::QualityLed), Level::High);
        controller.step(1_099);
        assert_eq!(handle.output(OutputId::QualityLed), Level::High);
        controller.step(1_100);
        assert_eq!(handle.output(OutputId::QualityLed), Level::Low);

        // Zero attention → NoSignal, meter stays dark.
        controller.headset_mut().push(reading(30, 0, 50));
        let events = controller.step(1_200);
        assert!(events.contains(&GameEvent::StatusChanged {
            status: HeadsetStatus::NoSignal
        }));
        assert_eq!(handle.intensity(OutputId::MeterLow), 0);
        assert_eq!(handle.intensity(OutputId::MeterHigh), 0);
    }

    #[test]
    fn stuck_signal_is_flagged_after_identical_readings() {
        let (mut controller, handle) = controller_with(ControllerConfig::default());
        controller.step(0);
        tap_button(&mut controller, &handle, 100);

        controller.headset_mut().push(reading(20, 40, 30));
        controller.step(300); // first good reading → On
        controller.headset_mut().push(reading(20, 40, 30));
        let events = controller.step(1_300);
        assert!(events.contains(&GameEvent::StatusChanged {
            status: HeadsetStatus::Stuck
        }));
        assert_eq!(controller.status(), HeadsetStatus::Stuck);
    }

    #[test]
    fn samples_collected_only_while_on() {
        let mut config = ControllerConfig::default();
        config.sample_capacity = 3;
        let (mut controller, handle) = controller_with(config);
        controller.step(0);
        tap_button(&mut controller, &handle, 100); // Attention

        let script = [
            reading(200, 50, 50), // Off → no sample
            reading(0, 41, 10),
            reading(0, 42, 10),
            reading(0, 43, 10),
        ];
        for (n, r) in script.iter().enumerate() {
            controller.headset_mut().push(*r);
            controller.step(300 + n as u64 * 1_000);
        }
        // Three On readings filled the 3-slot ring with attention values.
        assert!(controller.buffer.is_full());
        assert_eq!(controller.buffer.snapshot(), &[41, 42, 43]);
    }

    #[test]
    fn self_test_blinks_are_bounded() {
        let mut config = ControllerConfig::default();
        config.startup_self_test = true;
        config.auto_start = false;
        let (mut controller, handle) = controller_with(config);
        controller.step(0);
        // Four LEDs × 100 ms, no tones.
        assert_eq!(handle.blocked_ms(), 400);
        assert!(handle.take_tones().is_empty());
    }

    #[tokio::test]
    async fn run_forwards_events_and_stops_when_receiver_drops() {
        let mut config = ControllerConfig::default();
        config.loop_period_ms = 1;
        let (board, _handle) = SimBoard::new();
        let headset = ScriptedHeadset::new([]);
        let controller = GameController::new(config, board, headset);

        let (tx, mut rx) = mpsc::channel(16);
        let task = tokio::spawn(controller.run(tx));

        let first = rx.recv().await.expect("boot event");
        assert_eq!(
            first,
            GameEvent::StateChanged {
                state: GameState::Off
            }
        );

        drop(rx);
        // With no receiver the loop exits on its next send... which only
        // happens on the next event. Abort instead and accept either way.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        task.abort();
        let _ = task.await;
    }
}
