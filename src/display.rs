use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

impl CliDisplayMode {
  /// Parse a preference string, e.g. from `prefs.toml`. Unknown values give `None`.
  pub fn from_config(s: &str) -> Option<Self> {
    <Self as ValueEnum>::from_str(s.trim(), true).ok()
  }
}

/// How poster images are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// Grayscale character ramp.
  Ascii,
  /// True-color half-block cells.
  Direct,
  /// No posters; nothing is fetched.
  Off,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Off => "Off",
    }
  }

  pub fn shows_posters(self) -> bool {
    self != DisplayMode::Off
  }
}

/// Pick half-blocks when the terminal advertises true color (`COLORTERM` is `truecolor`
/// or `24bit`), ASCII otherwise.
pub fn detect_display_mode(colorterm: Option<&str>) -> DisplayMode {
  let colorterm = colorterm.unwrap_or_default().to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" { DisplayMode::Direct } else { DisplayMode::Ascii }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(std::env::var("COLORTERM").ok().as_deref()),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}
