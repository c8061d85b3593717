//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Pagination
  pub page_size: usize,

  // Simulated latency
  pub filter_latency_ms: u64,
  pub search_latency_ms: u64,
  pub load_more_latency_ms: u64,

  // Gallery cards
  pub card_width: u16,
  pub card_height: u16,
  pub poster_rows: u16,
  pub blurb_chars: usize,
  pub fade_step_ms: u64,

  // Posters
  pub poster_concurrency: usize,
  pub poster_timeout_secs: u64,

  // Status line
  pub error_dismiss_secs: u64,
}

impl Constants {
  pub fn filter_latency(&self) -> Duration {
    Duration::from_millis(self.filter_latency_ms)
  }

  pub fn search_latency(&self) -> Duration {
    Duration::from_millis(self.search_latency_ms)
  }

  pub fn load_more_latency(&self) -> Duration {
    Duration::from_millis(self.load_more_latency_ms)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test fails on first access.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.page_size, 8);
    assert!(c.poster_rows < c.card_height);
    assert!(c.poster_concurrency > 0);
  }

  #[test]
  fn latencies_match_configured_millis() {
    let c = constants();
    assert_eq!(c.filter_latency(), Duration::from_millis(c.filter_latency_ms));
    assert_eq!(c.search_latency(), Duration::from_millis(c.search_latency_ms));
    assert_eq!(c.load_more_latency(), Duration::from_millis(c.load_more_latency_ms));
  }
}
