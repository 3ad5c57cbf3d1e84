use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use focuswatch::{
    app::{App, Flow},
    clock::SystemClock,
    config::{log_path, Config, ConfigStore, FileConfigStore},
    detection::{HeadControl, HeadPose, SimulatedDetector, UnavailableDetector},
    error::DetectionError,
    runtime::{AppEventSource, CrosstermEventSource, DetectionLoop, FixedTicker, Runner, Ticker},
    session::FocusSession,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// study stopwatch that pauses itself when you look away
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A study stopwatch that watches your head pose: looking down at your desk counts as focused, looking up or leaving counts as distracted. Distraction pauses the stopwatch, focus resumes it."
)]
pub struct Cli {
    /// where focus verdicts come from
    #[clap(long, value_enum, default_value_t = Source::Simulated)]
    source: Source,

    /// display refresh period in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// delay before retrying a failed detection, in milliseconds
    #[clap(long)]
    retry_ms: Option<u64>,

    /// frame period of the simulated camera, in milliseconds
    #[clap(long)]
    frame_ms: Option<u64>,

    /// landmark noise of the simulated camera, in pixels
    #[clap(long, default_value_t = 4.0)]
    jitter: f64,

    /// share of simulated frames that fail transiently (0.0 - 1.0)
    #[clap(long, default_value_t = 0.0)]
    glitch_rate: f64,

    /// keep the stopwatch running regardless of focus
    #[clap(long)]
    no_auto_pause: bool,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<std::path::PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum Source {
    /// keyboard-steered synthetic face
    Simulated,
    /// no focus tracking, plain stopwatch
    Off,
}

impl Cli {
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.tick_ms {
            cfg.tick_interval_ms = ms;
        }
        if let Some(ms) = self.retry_ms {
            cfg.detection_retry_ms = ms;
        }
        if let Some(ms) = self.frame_ms {
            cfg.frame_interval_ms = ms;
        }
        if self.no_auto_pause {
            cfg.auto_pause = false;
        }
        cfg
    }
}

fn init_logging() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("FOCUSWATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("focuswatch=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
    }
    info!(source = %cli.source, ?config, "starting");

    let events = CrosstermEventSource::new();
    let (head, mut detection) = match cli.source {
        Source::Simulated => {
            let head = HeadControl::new(HeadPose::Down);
            let detector = SimulatedDetector::new(head.clone(), config.frame_interval())
                .with_jitter(cli.jitter)
                .with_glitch_rate(cli.glitch_rate);
            let dl = DetectionLoop::start(
                detector,
                SystemClock,
                events.sender(),
                config.detection_retry(),
            );
            (Some(head), dl)
        }
        Source::Off => {
            let detector = UnavailableDetector::new(DetectionError::CameraAccessDenied(
                "camera switched off".into(),
            ));
            let dl = DetectionLoop::start(
                detector,
                SystemClock,
                events.sender(),
                config.detection_retry(),
            );
            (None, dl)
        }
    };

    let mut app = App::new(FocusSession::with_config(SystemClock, &config), head);
    let mut runner = Runner::new(events, FixedTicker::new(config.tick_interval()));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &mut runner);

    detection.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock>,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match app.handle_event(runner.step()) {
            Flow::Quit => break,
            Flow::Redraw => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Flow::Idle => {}
        }
    }

    let view = app.session.view();
    info!(
        elapsed = %view.elapsed,
        focused = %view.focused_time,
        distracted = %view.distracted_time,
        focus_percentage = view.focus_percentage,
        "session closed"
    );
    Ok(())
}
