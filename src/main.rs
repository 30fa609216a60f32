use std::io::{self, BufRead};
use std::time::Duration;

use anyhow::Result;
use log::info;

use mindtag::controller::{ControllerConfig, GameController};
use mindtag::sim::{SimBoard, SyntheticHeadset};
use mindtag::types::GameEvent;

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=mindtag=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Configuration ─────────────────────────────────────────────────────────
    // The demo runs the full game loop against the in-memory simulator: a
    // synthetic headset sweeps attention/meditation so shots fire on their own.
    let config = ControllerConfig {
        startup_self_test: true,
        ..Default::default()
    };

    let (board, handle) = SimBoard::new();
    // One reading every 12 polls ≈ 5 Hz at the 16 ms loop period.
    let headset = SyntheticHeadset::new(12);
    let controller = GameController::new(config, board, headset);

    // ── Start the control loop ────────────────────────────────────────────────
    let (tx, mut rx) = tokio::sync::mpsc::channel::<GameEvent>(64);
    tokio::spawn(controller.run(tx));

    info!("Simulated blaster running. Press Ctrl-C or type 'q' + Enter to quit.\n");
    info!("Commands (type + Enter):");
    info!("  q  – quit");
    info!("  t  – tap the toggle button (cycle game state)\n");

    // ── Stdin command loop ────────────────────────────────────────────────────
    // Lines are read on a dedicated OS thread (to avoid holding a non-Send
    // StdinLock across await points), then relayed to an async task.
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l.trim().to_owned()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let button = handle.clone();
    tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            match line.as_str() {
                "q" => {
                    info!("Quit requested.");
                    std::process::exit(0);
                }
                "t" => {
                    info!("Tapping toggle button …");
                    button.press_button();
                    // Held well past the debounce window, then released.
                    tokio::time::sleep(Duration::from_millis(60)).await;
                    button.release_button();
                }
                "" => {}
                other => {
                    info!("Unknown command: '{other}'");
                }
            }
        }
    });

    // ── Main event loop ───────────────────────────────────────────────────────
    while let Some(event) = rx.recv().await {
        match event {
            GameEvent::StateChanged { state } => {
                println!("[STATE]  → {:?}", state);
            }
            GameEvent::StatusChanged { status } => {
                println!("[STATUS] headset {}", status.as_str());
            }
            GameEvent::ShotFired {
                magnitude,
                top_magnitude,
            } => {
                println!("[FIRE]   magnitude {magnitude}/{top_magnitude}");
            }
            GameEvent::Reading(reading) => {
                println!(
                    "[ESENSE] signal={:3}  attention={:2}  meditation={:2}",
                    reading.signal_quality, reading.attention, reading.meditation
                );
            }
        }
    }

    info!("Event loop finished – exiting.");
    Ok(())
}
