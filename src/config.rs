use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::constants::constants;
use crate::display::CliDisplayMode;
use crate::selection::GenreFilter;
use crate::session::RevealPolicy;
use crate::theme::theme_index;

/// User preferences from `prefs.toml`. Read-only: nothing is ever written back.
#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub display_mode: Option<String>,
  /// Page search results instead of showing every match at once.
  pub paginate_search: Option<bool>,
  pub simulate_latency: Option<bool>,
  /// External catalog file (`.json` or `.toml`).
  pub catalog: Option<PathBuf>,
  /// Genre chips to offer instead of the catalog's own genres.
  pub genres: Option<Vec<String>>,
}

impl Config {
  pub fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "animegrid").map(|dirs| dirs.config_dir().join("prefs.toml"))
  }

  pub fn parse(text: &str) -> Result<Self> {
    toml::from_str(text).context("Failed to parse prefs.toml")
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(&text)
  }

  /// Load preferences, falling back to defaults when the file is missing or invalid.
  pub fn load() -> Self {
    let Some(path) = Self::path() else { return Self::default() };
    if !path.exists() {
      return Self::default();
    }
    match Self::load_from(&path) {
      Ok(config) => config,
      Err(e) => {
        warn!(err = %format!("{:#}", e), path = %path.display(), "config: ignoring invalid preferences");
        Self::default()
      }
    }
  }
}

/// Command-line values that take precedence over `prefs.toml`.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
  pub theme: Option<String>,
  pub display_mode: Option<CliDisplayMode>,
  pub paginate_search: bool,
  pub no_latency: bool,
  pub catalog: Option<PathBuf>,
}

/// Simulated delays before a deferred gallery redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
  pub filter: Duration,
  pub search: Duration,
  pub load_more: Duration,
}

impl Latency {
  pub const NONE: Latency = Latency { filter: Duration::ZERO, search: Duration::ZERO, load_more: Duration::ZERO };

  pub fn from_constants() -> Self {
    let c = constants();
    Self { filter: c.filter_latency(), search: c.search_latency(), load_more: c.load_more_latency() }
  }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
  pub theme_index: usize,
  pub display_mode: CliDisplayMode,
  pub reveal_policy: RevealPolicy,
  pub latency: Latency,
  pub catalog: Option<PathBuf>,
  /// `None` means derive chips from the catalog.
  pub genres: Option<Vec<GenreFilter>>,
  pub page_size: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self::resolve(Config::default(), CliOverrides::default())
  }
}

impl Settings {
  pub fn resolve(config: Config, cli: CliOverrides) -> Self {
    let theme_index = theme_index(cli.theme.as_deref().or(config.theme_name.as_deref()));
    let display_mode = cli
      .display_mode
      .or_else(|| {
        let raw = config.display_mode.as_deref()?;
        let parsed = CliDisplayMode::from_config(raw);
        if parsed.is_none() {
          warn!(value = raw, "config: unknown display_mode, using auto");
        }
        parsed
      })
      .unwrap_or(CliDisplayMode::Auto);
    let reveal_policy = if cli.paginate_search || config.paginate_search.unwrap_or(false) {
      RevealPolicy::Paginate
    } else {
      RevealPolicy::ShowAllWhileSearching
    };
    let latency = if cli.no_latency || !config.simulate_latency.unwrap_or(true) {
      Latency::NONE
    } else {
      Latency::from_constants()
    };
    let genres = config.genres.map(|tokens| {
      let mut filters: Vec<GenreFilter> = vec![GenreFilter::All];
      for token in tokens {
        let filter = GenreFilter::parse(&token);
        if !filters.contains(&filter) {
          filters.push(filter);
        }
      }
      filters
    });
    Self {
      theme_index,
      display_mode,
      reveal_policy,
      latency,
      catalog: cli.catalog.or(config.catalog),
      genres,
      page_size: constants().page_size,
    }
  }

  /// Synchronous rendering, for tests.
  #[cfg(test)]
  pub fn immediate() -> Self {
    Self { latency: Latency::NONE, display_mode: CliDisplayMode::Off, ..Self::default() }
  }
}
