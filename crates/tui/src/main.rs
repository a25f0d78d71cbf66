mod app;
mod renderer;

use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use barrage_protocol::{Options, Timing};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "barrage", about = "Bullet comments scrolling across the terminal")]
struct Args {
    /// Screen options as a JSON file (camelCase keys, all optional).
    #[arg(long)]
    options: Option<PathBuf>,
    /// Rows per lane.
    #[arg(long)]
    lane_height: Option<f64>,
    /// Free columns a bullet leaves behind before the next may follow.
    #[arg(long)]
    gap: Option<f64>,
    /// Seconds a bullet takes to cross the screen.
    #[arg(long)]
    duration: Option<f64>,
    /// Milliseconds between sample bullets; also sets the lane cooldown.
    #[arg(long)]
    rate: Option<u64>,
    /// Write logs here. The terminal is taken by the UI.
    #[arg(long)]
    log: Option<PathBuf>,
}

fn load_options(args: &Args) -> Result<Options> {
    let mut options = match &args.options {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Options {
            lane_height: 1.0,
            gap: 4.0,
            timing: Timing {
                duration: 8.0,
                ..Timing::default()
            },
            send_rate: 250,
            ..Options::default()
        },
    };

    if let Some(lane_height) = args.lane_height {
        options.lane_height = lane_height;
    }
    if let Some(gap) = args.gap {
        options.gap = gap;
    }
    if let Some(duration) = args.duration {
        options.timing.duration = duration;
    }
    if let Some(rate) = args.rate {
        options.send_rate = rate;
    }
    Ok(options)
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barrage_core=debug,barrage_tui=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log {
        init_logging(path)?;
    }
    let options = load_options(&args)?;

    let (cols, rows) = crossterm::terminal::size()?;
    let mut app = App::new(options, cols, rows)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        app.step(now - last);
        last = now;

        terminal.draw(|frame| app.draw(frame))?;

        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !app.key(key.code) {
                        break;
                    }
                }
                Event::Mouse(mouse) => app.mouse(mouse),
                Event::Resize(cols, rows) => app.resize(cols, rows),
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn options_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write options");
        file
    }

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("barrage").chain(extra.iter().copied()))
    }

    #[test]
    fn terminal_defaults_without_a_file() {
        let options = load_options(&args(&[])).expect("defaults");
        assert_eq!(options.lane_height, 1.0);
        assert_eq!(options.send_rate, 250);
        assert_eq!(options.timing.duration, 8.0);
    }

    #[test]
    fn file_values_survive_when_flags_are_absent() {
        let file = options_file(r#"{"sendRate": 1000, "laneHeight": 2}"#);
        let path = file.path().to_str().expect("utf-8 path");
        let options = load_options(&args(&["--options", path])).expect("options");
        assert_eq!(options.send_rate, 1000);
        assert_eq!(options.lane_height, 2.0);
    }

    #[test]
    fn flags_override_file_values() {
        let file = options_file(r#"{"sendRate": 1000, "gap": 9}"#);
        let path = file.path().to_str().expect("utf-8 path");
        let options =
            load_options(&args(&["--options", path, "--rate", "120", "--duration", "3"]))
                .expect("options");
        assert_eq!(options.send_rate, 120);
        assert_eq!(options.gap, 9.0);
        assert_eq!(options.timing.duration, 3.0);
    }

    #[test]
    fn unreadable_options_file_is_an_error() {
        let file = options_file("{not json");
        let path = file.path().to_str().expect("utf-8 path");
        assert!(load_options(&args(&["--options", path])).is_err());
    }
}
