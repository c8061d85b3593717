mod app;
mod catalog;
mod config;
mod constants;
mod display;
mod graphics;
mod input;
mod pagination;
mod poster;
mod render;
mod selection;
mod session;
mod theme;
mod ui;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use app::App;
use catalog::Catalog;
use config::{CliOverrides, Config, Settings};
use display::CliDisplayMode;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Browse an anime catalog in the terminal", long_about = None)]
struct Args {
  /// Poster rendering: 'auto', 'direct', 'ascii' or 'off' (default: prefs, then auto-detect)
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// Catalog file to browse (.json or .toml) instead of the built-in one
  #[arg(short, long)]
  catalog: Option<PathBuf>,

  /// Colour theme by name
  #[arg(short, long)]
  theme: Option<String>,

  /// Redraw immediately instead of simulating network latency
  #[arg(long)]
  no_latency: bool,

  /// Page search results eight at a time instead of showing every match
  #[arg(long)]
  paginate_search: bool,
}

impl From<Args> for CliOverrides {
  fn from(args: Args) -> Self {
    Self {
      theme: args.theme,
      display_mode: args.display_mode,
      paginate_search: args.paginate_search,
      no_latency: args.no_latency,
      catalog: args.catalog,
    }
  }
}

// --- Logging ---

/// Log to a daily file; the terminal belongs to the UI. Keep the guard alive until exit.
fn init_logging(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
  use tracing_subscriber::{EnvFilter, fmt, prelude::*};

  let logs_dir = data_dir.join("logs");
  std::fs::create_dir_all(&logs_dir).ok();

  let file_appender = tracing_appender::rolling::daily(&logs_dir, "animegrid.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,animegrid=debug"));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true).with_line_number(true))
    .init();

  guard
}

fn load_catalog(settings: &Settings) -> Result<Catalog> {
  match settings.catalog {
    Some(ref path) => Catalog::load(path).with_context(|| format!("Failed to load catalog {}", path.display())),
    None => Catalog::builtin(),
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let data_dir = ProjectDirs::from("", "", "animegrid")
    .map(|dirs| dirs.data_local_dir().to_path_buf())
    .unwrap_or_else(|| PathBuf::from("."));
  let _guard = init_logging(&data_dir);

  let settings = Settings::resolve(Config::load(), args.into());
  // Fail before touching the terminal so the message stays readable.
  let catalog = Arc::new(load_catalog(&settings)?);
  if catalog.is_empty() {
    warn!("catalog has no entries; every view will be empty");
  }
  let display_mode = display::resolve_display_mode(settings.display_mode);
  info!(version = env!("CARGO_PKG_VERSION"), policy = ?settings.reveal_policy, "animegrid starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let mut app = App::new(&settings, catalog, display_mode);
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  if let Err(ref e) = result {
    error!(err = %format!("{:#}", e), "animegrid exited with an error");
  }
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(app, key),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  info!("animegrid exiting");
  Ok(())
}
