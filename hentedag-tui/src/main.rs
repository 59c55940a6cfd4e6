//! Terminal dashboard for hentedag that polls the pickup sensors of one address.

mod app;
mod config;
mod input;
mod ui;

use std::{
    fs::OpenOptions,
    io,
    sync::Arc,
    time::{Duration as StdDuration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use env_logger::Target;
use hentedag_core::{Clock, LocalClock, SchedulePort, WasteService};
use hentedag_provider_oslo::{OsloSchedulePort, http_client};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config::{Cli, Settings};
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load(Cli::parse())?;
    init_logging(&settings)?;

    // HTTP + service setup
    let port: Arc<dyn SchedulePort> = Arc::new(
        OsloSchedulePort::new(http_client()?)
            .with_base_url(settings.base_url.clone())
            .with_timeout(settings.timeout),
    );
    let clock: Arc<dyn Clock> = Arc::new(LocalClock);

    let address = settings.platform.address.clone();
    let service = WasteService::setup(settings.platform, port, clock)
        .await
        .with_context(|| format!("loading the pickup schedule for {address}"))?;

    // App state
    let app = App::new(service, settings.poll_interval);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

// The terminal belongs to the UI, so logs only go to a file.
fn init_logging(settings: &Settings) -> Result<()> {
    let Some(path) = settings.log_file.as_deref() else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    env_logger::Builder::new()
        .filter_level(settings.log_level)
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    // First cycle runs right away
    let mut next_poll = Instant::now();

    loop {
        if Instant::now() >= next_poll {
            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, &app))?;

            app.poll().await;

            app.is_loading = false;
            next_poll = Instant::now() + app.poll_interval;
        }

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::PollNow => next_poll = Instant::now(),
            }
        }
    }

    Ok(())
}
