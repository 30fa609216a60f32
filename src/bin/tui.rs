//! Live dashboard for the simulated blaster.
//!
//! Runs the full game loop against the in-memory board with a synthetic
//! headset, and renders everything the hardware would show: the RGB state
//! lamp, the signal-quality LED, the three-band magnitude meter, and the IR
//! emitter.
//!
//! Usage:
//!   cargo run --bin tui
//!
//! Keys
//! ----
//!   t        tap the toggle button (cycle Off → Attention → Meditation)
//!   q / Esc  quit

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use mindtag::controller::{ControllerConfig, GameController};
use mindtag::game::GameState;
use mindtag::hal::{Level, OutputId};
use mindtag::sim::{SimBoard, SimHandle, SyntheticHeadset};
use mindtag::types::{GameEvent, HeadsetReading, HeadsetStatus};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Render / input-poll period. ~30 FPS keeps the gauges smooth without
/// burning CPU.
const TICK: Duration = Duration::from_millis(33);

/// Synthetic headset cadence: one reading every N controller polls.
/// 12 polls at the default 16 ms loop period ≈ 5 readings per second.
const HEADSET_POLL_INTERVAL: u32 = 12;

/// How long a simulated button tap stays pressed. Longer than the 30 ms
/// debounce window so every tap registers.
const BUTTON_HOLD: Duration = Duration::from_millis(60);

/// Number of entries kept in the shot log panel.
const SHOT_LOG_LEN: usize = 12;

/// Full-scale eSense magnitude, used to normalise the gauges.
const TOP_MAGNITUDE: f64 = 99.0;

// ── App state ─────────────────────────────────────────────────────────────────

struct App {
    state: GameState,
    status: HeadsetStatus,
    reading: Option<HeadsetReading>,
    /// Most recent shots, newest first, pre-formatted for the log panel.
    shots: VecDeque<String>,
    shot_count: u64,
    reading_count: u64,
    started: Instant,
}

impl App {
    fn new() -> Self {
        Self {
            state: GameState::Off,
            status: HeadsetStatus::Off,
            reading: None,
            shots: VecDeque::with_capacity(SHOT_LOG_LEN),
            shot_count: 0,
            reading_count: 0,
            started: Instant::now(),
        }
    }

    /// Fold one controller event into the display state.
    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::StateChanged { state } => self.state = state,
            GameEvent::StatusChanged { status } => self.status = status,
            GameEvent::Reading(reading) => {
                self.reading = Some(reading);
                self.reading_count += 1;
            }
            GameEvent::ShotFired {
                magnitude,
                top_magnitude,
            } => {
                self.shot_count += 1;
                let t = self.started.elapsed().as_secs_f64();
                self.shots.push_front(format!(
                    "#{:<3} {t:7.1}s  magnitude {magnitude}/{top_magnitude}",
                    self.shot_count
                ));
                while self.shots.len() > SHOT_LOG_LEN {
                    self.shots.pop_back();
                }
            }
        }
    }
}

fn state_color(state: GameState) -> Color {
    match state {
        GameState::Off => Color::DarkGray,
        GameState::Attention => Color::Red,
        GameState::Meditation => Color::Blue,
    }
}

fn status_color(status: HeadsetStatus) -> Color {
    match status {
        HeadsetStatus::On => Color::Green,
        HeadsetStatus::Stuck => Color::Yellow,
        HeadsetStatus::NoSignal => Color::Yellow,
        HeadsetStatus::Off => Color::Red,
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Top-level render callback: header / body / footer, with the body split
/// into the gauge column and the lamp-and-log column.
fn draw(frame: &mut Frame, app: &App, handle: &SimHandle) {
    let root = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .split(frame.area());

    draw_header(frame, root[0], app);

    let body = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(root[1]);
    draw_gauges(frame, body[0], app, handle);
    draw_side(frame, body[1], app, handle);

    draw_footer(frame, root[2]);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled(
            " MINDTAG Blaster ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("state: {:?}", app.state),
            Style::default()
                .fg(state_color(app.state))
                .add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("headset: {}", app.status.as_str()),
            Style::default()
                .fg(status_color(app.status))
                .add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("{} readings", app.reading_count),
            Style::default().fg(Color::White),
        ),
        sep(),
        Span::styled(
            format!("{} shots", app.shot_count),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
    ]);

    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Dimmed vertical separator used between header fields.
#[inline]
fn sep<'a>() -> Span<'a> {
    Span::styled(" │ ", Style::default().fg(Color::DarkGray))
}

/// The left column: eSense gauges plus the three magnitude-meter bands as
/// the board actually drives them (0–255 analog writes).
fn draw_gauges(frame: &mut Frame, area: Rect, app: &App, handle: &SimHandle) {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(area);

    let (attention, meditation) = app
        .reading
        .map(|r| (r.attention, r.meditation))
        .unwrap_or((0, 0));

    esense_gauge(frame, rows[0], "Attention", attention, Color::Cyan);
    esense_gauge(frame, rows[1], "Meditation", meditation, Color::Magenta);

    meter_gauge(frame, rows[2], "Meter Low", handle.intensity(OutputId::MeterLow));
    meter_gauge(frame, rows[3], "Meter Mid", handle.intensity(OutputId::MeterMid));
    meter_gauge(frame, rows[4], "Meter High", handle.intensity(OutputId::MeterHigh));
}

fn esense_gauge(frame: &mut Frame, area: Rect, title: &str, value: u8, color: Color) {
    let ratio = (f64::from(value) / TOP_MAGNITUDE).clamp(0.0, 1.0);
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
            .gauge_style(Style::default().fg(color))
            .label(format!("{value}/99"))
            .ratio(ratio),
        area,
    );
}

fn meter_gauge(frame: &mut Frame, area: Rect, title: &str, value: u8) {
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
            .gauge_style(Style::default().fg(Color::Yellow))
            .label(format!("{value}/255"))
            .ratio(f64::from(value) / 255.0),
        area,
    );
}

/// The right column: the physical indicator lamps plus the shot log.
fn draw_side(frame: &mut Frame, area: Rect, app: &App, handle: &SimHandle) {
    let rows = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).split(area);

    let firing = handle.output(OutputId::IrEmitter) == Level::High;
    let quality = handle.output(OutputId::QualityLed) == Level::High;

    let lamps = vec![
        Line::from(vec![
            lamp("IR emitter", firing, Color::LightRed),
            Span::raw("   "),
            lamp("quality LED", quality, Color::Green),
        ]),
        Line::from(vec![
            lamp("R", handle.output(OutputId::RgbRed) == Level::High, Color::Red),
            Span::raw(" "),
            lamp("G", handle.output(OutputId::RgbGreen) == Level::High, Color::Green),
            Span::raw(" "),
            lamp("B", handle.output(OutputId::RgbBlue) == Level::High, Color::Blue),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lamps).block(Block::default().borders(Borders::ALL).title(" Lamps ")),
        rows[0],
    );

    let items: Vec<ListItem> = if app.shots.is_empty() {
        vec![ListItem::new(Span::styled(
            "  no shots yet — raise the high band past the threshold",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.shots
            .iter()
            .map(|entry| ListItem::new(Span::raw(format!(" {entry}"))))
            .collect()
    };
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Shot log ")),
        rows[1],
    );
}

/// One ● indicator, lit in `color` when `on`.
fn lamp(label: &str, on: bool, color: Color) -> Span<'_> {
    let (bullet, fg) = if on { ("● ", color) } else { ("○ ", Color::DarkGray) };
    Span::styled(
        format!(" {bullet}{label}"),
        Style::default().fg(fg).add_modifier(if on {
            Modifier::BOLD
        } else {
            Modifier::empty()
        }),
    )
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let keys = Line::from(vec![
        Span::raw(" "),
        key("[t]"),
        Span::raw("Tap toggle button  "),
        key("[q]"),
        Span::raw("Quit"),
    ]);
    frame.render_widget(
        Paragraph::new(keys).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Styled keybinding label (bold yellow) used in the footer hint line.
#[inline]
fn key(s: &str) -> Span<'_> {
    Span::styled(
        s,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    use std::io::IsTerminal as _;
    if !io::stdout().is_terminal() {
        eprintln!("Error: the tui binary requires a real terminal (TTY).");
        eprintln!("Run it directly in a terminal emulator, not piped or redirected.");
        std::process::exit(1);
    }

    // ── Logging ───────────────────────────────────────────────────────────────
    // Write logs to a file so they never interfere with the TUI display.
    // Logs are written to mindtag-tui.log in the current directory.
    {
        use std::fs::File;
        if let Ok(file) = File::create("mindtag-tui.log") {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
    }

    // ── Start the control loop ────────────────────────────────────────────────
    let (board, handle) = SimBoard::new();
    let headset = SyntheticHeadset::new(HEADSET_POLL_INTERVAL);
    let controller = GameController::new(ControllerConfig::default(), board, headset);

    let (tx, mut rx) = mpsc::channel::<GameEvent>(64);
    tokio::spawn(controller.run(tx));

    // ── Terminal setup ────────────────────────────────────────────────────────
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new();
    // When a simulated tap is pending release.
    let mut release_at: Option<Instant> = None;

    // ── Main loop ─────────────────────────────────────────────────────────────
    'main: loop {
        // ── 1. Drain controller events ────────────────────────────────────────
        while let Ok(event) = rx.try_recv() {
            app.on_event(event);
        }

        // ── 2. Release a pending button tap ───────────────────────────────────
        if release_at.is_some_and(|t| Instant::now() >= t) {
            handle.release_button();
            release_at = None;
        }

        // ── 3. Render ─────────────────────────────────────────────────────────
        terminal.draw(|f| draw(f, &app, &handle))?;

        // ── 4. Handle keyboard ────────────────────────────────────────────────
        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break 'main,
            _ if ctrl_c => break 'main,
            KeyCode::Char('t') => {
                if release_at.is_none() {
                    handle.press_button();
                    release_at = Some(Instant::now() + BUTTON_HOLD);
                }
            }
            _ => {}
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
