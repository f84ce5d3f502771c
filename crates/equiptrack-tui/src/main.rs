//! Equiptrack TUI - Terminal UI for tracking safety equipment
//!
//! Built with Ratatui and crossterm.

mod app;
mod config;
mod handlers;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use equiptrack_core::{repository, BackendKind, EquipmentStore, StatusEvaluator};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use app::{App, AppState};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Database,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => BackendKind::File,
            BackendArg::Database => BackendKind::Database,
        }
    }
}

/// Equiptrack TUI - track issuance and renewal of safety equipment
#[derive(Parser, Debug)]
#[command(name = "equiptrack-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Persistence backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// CSV file for the file backend (overrides config)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// SQLite file for the database backend (overrides config)
    #[arg(short, long, value_name = "FILE")]
    database: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("equiptrack_tui=info".parse()?),
        )
        .with_writer(std::io::stderr) // Write logs to stderr to not interfere with TUI
        .init();

    let args = Args::parse();

    let mut config = config::Config::load(args.config)?;
    if let Some(backend) = args.backend {
        config.backend = backend.into();
    }
    if let Some(path) = args.file {
        config.csv_path = path;
    }
    if let Some(path) = args.database {
        config.database_path = path;
    }
    tracing::info!(
        "Starting Equiptrack TUI with {} backend ({})",
        config.backend,
        match config.backend {
            BackendKind::File => config.csv_path.display(),
            BackendKind::Database => config.database_path.display(),
        }
    );

    let repository = repository::open(config.backend, &config.csv_path, &config.database_path)
        .context("Failed to open record storage")?;
    let store = EquipmentStore::new(repository, StatusEvaluator::new(config.policy))
        .with_malformed_policy(config.malformed_rows);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, config.credentials).with_load_path(config.csv_path);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases as well
                if key.kind == KeyEventKind::Press && handlers::handle_key(app, key) {
                    break;
                }
            }
        }

        if matches!(app.state, AppState::Quit) {
            break;
        }
    }

    Ok(())
}
