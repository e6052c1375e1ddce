use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute, terminal,
};

use flappy_ai::audio::Audio;
use flappy_ai::commentary::{CommentaryDesk, GeminiCommentator};
use flappy_ai::driver::Driver;
use flappy_ai::render::Renderer;
use flappy_ai::{AppError, CommentaryConfig, GameConfig, Simulation};

#[derive(Debug, Parser)]
#[command(name = "flappy-ai", version, about = "Flappy Bird in your terminal, with an AI announcer")]
struct Args {
    /// Seed for obstacle placement (random if omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Turn off sound.
    #[arg(long)]
    mute: bool,

    /// Don't call the commentary service.
    #[arg(long)]
    no_commentary: bool,

    /// Write logs to this file (the terminal is busy drawing the game).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<(), AppError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let result = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| AppError::Logging(e.to_string()))
}

/// Raw mode + alternate screen for the lifetime of the value.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let setup = execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            EnableMouseCapture,
        );
        undo_on_err(setup, restore_terminal)?;
        Ok(Self)
    }
}

/// Undoes whatever part of `TerminalGuard::enter` took effect.
fn restore_terminal() {
    let _ = execute!(
        stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    );
    let _ = terminal::disable_raw_mode();
}

/// Runs `undo` when `result` is an error. No guard exists yet at that point,
/// so `Drop` won't clean up.
fn undo_on_err<T>(result: io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    if let Err(e) = &result {
        tracing::warn!(error = %e, "terminal setup failed, restoring the terminal");
        undo();
    }
    result
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

enum Control {
    Continue,
    Quit,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing(args.log_file.as_ref())?;

    let config = GameConfig::default();
    config.validate()?;

    let mut sim = match args.seed {
        Some(seed) => Simulation::seeded(config, seed),
        None => Simulation::new(config),
    };

    let mut desk = if args.no_commentary {
        CommentaryDesk::disabled()
    } else {
        let commentary = CommentaryConfig::from_env();
        if commentary.api_key.is_none() {
            tracing::warn!("no GEMINI_API_KEY set, commentary will use the fallback line");
        }
        CommentaryDesk::new(Arc::new(GeminiCommentator::new(commentary)))
    };

    let audio = if args.mute { Audio::muted() } else { Audio::open() };

    let _terminal = TerminalGuard::enter()?;
    let mut out = stdout();
    let (cols, rows) = terminal::size()?;
    let mut renderer = Renderer::new(cols, rows);
    let mut driver = Driver::new(args.fps);
    driver.start();
    tracing::info!(fps = args.fps, seed = ?args.seed, "game started");

    loop {
        // Input
        while event::poll(Duration::ZERO)? {
            if let Control::Quit = handle_event(event::read()?, &mut sim, &mut renderer) {
                driver.stop();
            }
        }
        if !driver.is_running() {
            break;
        }

        // Update
        let run_before = sim.run();
        if let Some(report) = driver.pump(&mut sim) {
            if sim.run() != run_before {
                desk.begin_run(sim.run());
            }
            for sound in &report.sounds {
                audio.play(*sound);
            }
            if let Some(summary) = report.ended {
                desk.request(summary.run, summary.score);
            }
        }

        // Render
        let commentary = desk.poll().clone();
        renderer.present(&mut out, &sim.snapshot(), &commentary)?;

        driver.pace();
    }

    tracing::info!(best = sim.best(), "game closed");
    Ok(())
}

fn handle_event(event: Event, sim: &mut Simulation, renderer: &mut Renderer) -> Control {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char(' ') | KeyCode::Up | KeyCode::Char('w') => sim.press(),
            KeyCode::Enter | KeyCode::Char('r') => sim.request_restart(),
            _ => {}
        },
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            sim.press();
        }
        Event::Resize(cols, rows) => renderer.resize(cols, rows),
        _ => {}
    }
    Control::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_setup_is_undone() {
        let mut undone = false;
        let result: io::Result<()> = undo_on_err(Err(io::Error::other("no tty")), || undone = true);
        assert!(result.is_err());
        assert!(undone);
    }

    #[test]
    fn successful_setup_is_kept() {
        let mut undone = false;
        let result = undo_on_err(Ok(7), || undone = true);
        assert_eq!(result.unwrap(), 7);
        assert!(!undone);
    }
}
