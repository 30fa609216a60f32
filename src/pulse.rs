//! Non-blocking pulsed-output scheduler.
//!
//! The cooperative replacement for delay-based blink helpers: arming a pulse
//! drives the pin HIGH immediately and records when it should fall; the main
//! loop's [`PulseScheduler::tick`] turns expired outputs LOW. Nothing here
//! ever waits — timers are checked, not awaited.

use crate::hal::{Board, Level, OutputId};

#[derive(Debug, Clone, Copy)]
struct PulseTimer {
    armed_at: u64,
    duration_ms: u64,
}

impl PulseTimer {
    /// Wrap-safe expiry check: correct even across a clock wraparound because
    /// the elapsed time is computed by unsigned subtraction.
    fn expired(&self, now: u64) -> bool {
        now.wrapping_sub(self.armed_at) >= self.duration_ms
    }
}

/// Tracks an "active until" window per output. At most one timer exists per
/// physical output; re-pulsing an armed output overwrites its expiry (last
/// pulse wins).
#[derive(Debug, Default)]
pub struct PulseScheduler {
    armed: [Option<PulseTimer>; OutputId::COUNT],
}

impl PulseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `output` HIGH now and schedule it to fall after `duration_ms`.
    pub fn pulse<B: Board + ?Sized>(
        &mut self,
        board: &mut B,
        output: OutputId,
        now: u64,
        duration_ms: u64,
    ) {
        board.set_output(output, Level::High);
        self.armed[output.index()] = Some(PulseTimer {
            armed_at: now,
            duration_ms,
        });
    }

    /// Hold `output` at `level` indefinitely, disarming any pending pulse so
    /// a later [`PulseScheduler::tick`] cannot knock it back down.
    pub fn set_steady<B: Board + ?Sized>(&mut self, board: &mut B, output: OutputId, level: Level) {
        self.armed[output.index()] = None;
        board.set_output(output, level);
    }

    /// Expire every armed output whose window has passed, driving it LOW
    /// exactly once. Must be called every loop iteration; this is the sole
    /// mechanism that ends a pulse.
    pub fn tick<B: Board + ?Sized>(&mut self, board: &mut B, now: u64) {
        for (index, slot) in self.armed.iter_mut().enumerate() {
            if let Some(timer) = slot {
                if timer.expired(now) {
                    board.set_output(OutputId::ALL[index], Level::Low);
                    *slot = None;
                }
            }
        }
    }

    /// Whether `output` currently has an unexpired pulse armed.
    pub fn is_armed(&self, output: OutputId) -> bool {
        self.armed[output.index()].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;

    #[test]
    fn output_high_until_expiry_then_low_once() {
        let (mut board, handle) = SimBoard::new();
        let mut sched = PulseScheduler::new();

        sched.pulse(&mut board, OutputId::IrEmitter, 1_000, 500);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::High);

        sched.tick(&mut board, 1_499);
        assert_eq!(
            handle.output(OutputId::IrEmitter),
            Level::High,
            "pulse must stay HIGH before the window closes"
        );
        assert!(sched.is_armed(OutputId::IrEmitter));

        sched.tick(&mut board, 1_500);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::Low);
        assert!(!sched.is_armed(OutputId::IrEmitter));

        // Manually raise the pin: a further tick must not touch it again.
        board.set_output(OutputId::IrEmitter, Level::High);
        sched.tick(&mut board, 2_000);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::High);
    }

    #[test]
    fn repulse_extends_the_window() {
        let (mut board, handle) = SimBoard::new();
        let mut sched = PulseScheduler::new();

        sched.pulse(&mut board, OutputId::QualityLed, 0, 100);
        sched.pulse(&mut board, OutputId::QualityLed, 50, 100);

        sched.tick(&mut board, 120);
        assert_eq!(
            handle.output(OutputId::QualityLed),
            Level::High,
            "later pulse wins: expiry moved to 150"
        );
        sched.tick(&mut board, 150);
        assert_eq!(handle.output(OutputId::QualityLed), Level::Low);
    }

    #[test]
    fn steady_disarms_pending_pulse() {
        let (mut board, handle) = SimBoard::new();
        let mut sched = PulseScheduler::new();

        sched.pulse(&mut board, OutputId::QualityLed, 0, 100);
        sched.set_steady(&mut board, OutputId::QualityLed, Level::High);
        sched.tick(&mut board, 10_000);
        assert_eq!(
            handle.output(OutputId::QualityLed),
            Level::High,
            "steady level must survive ticks past the old expiry"
        );
    }

    #[test]
    fn outputs_expire_independently() {
        let (mut board, handle) = SimBoard::new();
        let mut sched = PulseScheduler::new();

        sched.pulse(&mut board, OutputId::IrEmitter, 0, 500);
        sched.pulse(&mut board, OutputId::QualityLed, 0, 800);

        sched.tick(&mut board, 600);
        assert_eq!(handle.output(OutputId::IrEmitter), Level::Low);
        assert_eq!(handle.output(OutputId::QualityLed), Level::High);
    }

    #[test]
    fn expiry_survives_clock_wraparound() {
        let (mut board, handle) = SimBoard::new();
        let mut sched = PulseScheduler::new();

        let near_wrap = u64::MAX - 100;
        sched.pulse(&mut board, OutputId::IrEmitter, near_wrap, 500);

        sched.tick(&mut board, near_wrap.wrapping_add(400));
        assert_eq!(handle.output(OutputId::IrEmitter), Level::High);

        sched.tick(&mut board, near_wrap.wrapping_add(500));
        assert_eq!(handle.output(OutputId::IrEmitter), Level::Low);
    }
}
