//! # mindtag
//!
//! Control loop for a brain-controlled laser-tag blaster: a NeuroSky
//! ThinkGear EEG headset drives an IR emitter, an RGB state lamp, a
//! signal-quality LED, and a three-band magnitude meter.
//!
//! The crate separates the game logic from the hardware behind two small
//! traits ([`hal::Board`] and [`hal::HeadsetSource`]), so the whole loop runs
//! identically against real pins or against the in-memory simulator in
//! [`sim`] — which is also how the unit tests and the bundled TUI work.
//!
//! ## Behaviour summary
//!
//! | Concern | Rule |
//! |---|---|
//! | Game states | Off → Attention → Meditation, cycled by a debounced button |
//! | Magnitude | state-selected eSense value (0–99), split into three meter bands |
//! | Firing | high-band intensity ≥ threshold while the headset is On, 600 ms cooldown |
//! | IR pulse | 500 ms, non-blocking; ended only by the pulse scheduler's tick |
//! | Quality LED | steady HIGH when On; pulse length encodes Off / NoSignal / Stuck |
//!
//! ## Quick start
//!
//! ```no_run
//! use mindtag::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (board, handle) = SimBoard::new();
//!     let headset = SyntheticHeadset::new(12);
//!     let controller = GameController::new(ControllerConfig::default(), board, headset);
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//!     tokio::spawn(controller.run(tx));
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             GameEvent::ShotFired { magnitude, top_magnitude } => {
//!                 println!("fired at {magnitude}/{top_magnitude}");
//!             }
//!             GameEvent::StateChanged { state } => println!("state: {state:?}"),
//!             _ => {}
//!         }
//!     }
//!     let _ = handle;
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`controller`] | The main loop: [`controller::GameController`] and its config |
//! | [`game`] | Game state machine, per-state colors and tone sequences |
//! | [`trigger`] | Band mapping and the threshold + cooldown fire detector |
//! | [`pulse`] | Non-blocking pulsed-output scheduler |
//! | [`status`] | Headset status classification and quality-LED pulse lengths |
//! | [`buffer`] | Fixed-capacity circular sample buffer |
//! | [`parse`] | ThinkGear serial-frame parser |
//! | [`protocol`] | ThinkGear wire constants and the payload checksum |
//! | [`hal`] | Board / clock / headset traits the loop is written against |
//! | [`sim`] | In-memory board and scripted/synthetic headsets |
//! | [`types`] | Readings, statuses, and the [`types::GameEvent`] stream |

pub mod buffer;
pub mod controller;
pub mod game;
pub mod hal;
pub mod parse;
pub mod protocol;
pub mod pulse;
pub mod sim;
pub mod status;
pub mod trigger;
pub mod types;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
///
/// A single glob import covers building a controller, wiring it to a board
/// (real or simulated), and consuming its event stream:
///
/// ```no_run
/// use mindtag::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let (board, _handle) = SimBoard::new();
/// let controller = GameController::new(
///     ControllerConfig::default(),
///     board,
///     SyntheticHeadset::new(12),
/// );
/// let (tx, mut rx) = tokio::sync::mpsc::channel(64);
/// tokio::spawn(controller.run(tx));
/// while let Some(event) = rx.recv().await {
///     if let GameEvent::Reading(r) = event {
///         println!("attention {}", r.attention);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    // ── Controller ────────────────────────────────────────────────────────────
    pub use crate::controller::{ControllerConfig, GameController};
    pub use crate::game::{GameState, GameStateMachine};

    // ── Events and data types ─────────────────────────────────────────────────
    pub use crate::types::{GameEvent, HeadsetReading, HeadsetStatus};

    // ── Hardware abstraction ──────────────────────────────────────────────────
    pub use crate::hal::{
        Board, Clock, HeadsetSource, InputId, Level, MonotonicClock, OutputId,
    };

    // ── Simulation and parsing ────────────────────────────────────────────────
    pub use crate::parse::ThinkGearParser;
    pub use crate::sim::{ScriptedHeadset, SimBoard, SimHandle, SyntheticHeadset};
}
