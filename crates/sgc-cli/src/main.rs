//! `sgc`: schema-driven data entry in the terminal.
//!
//! # Usage
//!
//! ```text
//! sgc                          # terminal UI
//! sgc --data-dir ~/planillas   # templates somewhere else
//! sgc list
//! sgc show Gastos
//! sgc export Gastos --records --output gastos.json
//! sgc fill Gastos
//! ```

mod app;
mod commands;
mod settings;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use sgc_store_json::JsonStore;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sgc", about = "Schema-driven data-entry templates, forms and records")]
struct Args {
  /// Path to a TOML config file (default: sgc.toml, if present).
  #[arg(short, long, value_name = "FILE", env = "SGC_CONFIG")]
  config: Option<PathBuf>,

  /// Directory holding template files.
  #[arg(long, value_name = "DIR")]
  data_dir: Option<PathBuf>,

  /// Directory holding record files, relative to the data directory.
  #[arg(long, value_name = "DIR")]
  records_dir: Option<PathBuf>,

  /// Keep submitted records in memory only.
  #[arg(long)]
  no_persist: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Open the terminal UI (the default).
  Tui,
  /// List stored templates.
  List,
  /// Show a template's fields and its records with their total.
  Show { name: String },
  /// Print a stored template, or its records, as JSON.
  Export {
    name:    String,
    /// Export the records file instead of the template.
    #[arg(long)]
    records: bool,
    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output:  Option<PathBuf>,
  },
  /// Parse a JSON file and print it. Nothing is stored.
  Import { file: PathBuf },
  /// Fill in and save one record from stdin.
  Fill { name: String },
  /// Delete a template. Its records are kept.
  Delete { name: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  let args = Args::parse();

  let (config_path, explicit) = match &args.config {
    Some(path) => (path.clone(), true),
    None => (PathBuf::from("sgc.toml"), false),
  };
  let mut settings = Settings::load(&config_path, explicit)?;

  // CLI flags override the config file and environment.
  if let Some(dir) = args.data_dir {
    settings.data_dir = dir;
  }
  if let Some(dir) = args.records_dir {
    settings.records_dir = dir;
  }
  if args.no_persist {
    settings.persist_records = false;
  }

  let command = args.command.unwrap_or(Command::Tui);
  match &command {
    Command::Tui => init_file_logging(&settings.log_file)?,
    _ => init_stderr_logging(),
  }

  let store = JsonStore::open(&settings.data_dir, &settings.records_dir)
    .with_context(|| format!("opening data directory {}", settings.data_dir.display()))?;
  tracing::debug!(?settings, "configuration loaded");

  let mut stdout = io::stdout();
  match command {
    Command::Tui => run_tui(store, &settings),
    Command::List => commands::list(&store, &mut stdout),
    Command::Show { name } => commands::show(&store, &name, &mut stdout),
    Command::Export {
      name,
      records,
      output,
    } => commands::export(&store, &name, records, output.as_deref(), &mut stdout),
    Command::Import { file } => commands::import(&file, &mut stdout),
    Command::Fill { name } => commands::fill(&store, &name, settings.persist_records),
    Command::Delete { name } => commands::delete(&store, &name, &mut stdout),
  }
}

// ─── Logging ──────────────────────────────────────────────────────────────────

fn env_filter() -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy()
}

fn init_stderr_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter())
    .with_writer(io::stderr)
    .init();
}

/// The terminal UI owns stdout and stderr, so its log goes to a file.
fn init_file_logging(path: &Path) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(env_filter())
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

fn run_tui(store: JsonStore, settings: &Settings) -> Result<()> {
  let mut app = App::new(store, settings.persist_records, settings.field_limits());

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = app
    .load_templates()
    .and_then(|()| run_event_loop(&mut terminal, &mut app));

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    if !event::poll(Duration::from_millis(250))? {
      continue;
    }
    match event::read()? {
      // Windows reports both press and release.
      Event::Key(key) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key)? {
          break;
        }
      }
      // Terminal will redraw on next iteration.
      Event::Resize(..) => {}
      _ => {}
    }
  }
  Ok(())
}
