//! booking-admin binary entry point.
//!
//! Parses the command line, signs in (or seeds the demo stores), initializes the
//! terminal in raw mode, runs the TUI event loop and restores the terminal on exit.
//!
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use booking_admin::Result;
use booking_admin::api::http::HttpApi;
use booking_admin::api::Session;
use booking_admin::app::keymap::Keymap;
use booking_admin::app::{self, AppState, Backends, ListOptions, Theme};
use booking_admin::config::{Cli, Settings, ensure_dir};
use booking_admin::error::Context;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Log to a file; the terminal belongs to the TUI.
fn init_logging(settings: &Settings) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_ctx(|| format!("open log file {}", settings.log_file.display()))?;
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn connect(settings: &Settings, runtime: &tokio::runtime::Runtime) -> Result<Backends> {
    if settings.demo {
        tracing::info!("using seeded in-memory data");
        return Ok(Backends::demo(settings.demo_latency));
    }
    let session = Session::default().shared();
    let api = HttpApi::new(settings.api.clone(), session.clone())?;
    if let Some(creds) = &settings.credentials {
        let signed_in = runtime.block_on(api.sign_in(&creds.email, &creds.password))?;
        tracing::info!(user = %signed_in.display_name(), admin = signed_in.is_admin(), "session started");
    }
    Ok(Backends::shared(Arc::new(api), session))
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let settings = match Cli::parse().into_settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("booking-admin: {e}");
            std::process::exit(2);
        }
    };
    ensure_dir(&settings.config_dir)?;
    init_logging(&settings)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_ctx(|| "start async runtime".to_string())?;
    let backends = match connect(&settings, &runtime) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "sign-in failed");
            eprintln!("booking-admin: sign-in failed: {e}");
            std::process::exit(1);
        }
    };

    let mut app = AppState::new(
        backends,
        runtime.handle().clone(),
        ListOptions::from_settings(&settings),
        Theme::load_or_init(settings.theme_path()),
        Keymap::load_or_init(settings.keybinds_path()),
    );

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    if app.logged_out {
        println!("Logged out.");
    }
    Ok(())
}
