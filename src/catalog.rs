use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Episode information: a positive count, or a free-text label such as "Movie" or "1000+".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EpisodeCount {
  Count(u32),
  Label(String),
}

/// Airing status. Display-only; never used for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Status {
  Completed,
  Ongoing,
  Movie,
  Upcoming,
  Hiatus,
}

impl Status {
  pub fn label(self) -> &'static str {
    match self {
      Status::Completed => "Completed",
      Status::Ongoing => "Ongoing",
      Status::Movie => "Movie",
      Status::Upcoming => "Upcoming",
      Status::Hiatus => "Hiatus",
    }
  }
}

/// A single catalog item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entry {
  pub id: u32,
  pub title: String,
  pub description: String,
  pub genre: String,
  pub rating: f32,
  pub year: i32,
  pub episodes: EpisodeCount,
  pub image_url: String,
  pub status: Status,
}

/// TOML catalogs wrap the entry list in `[[entries]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
  entries: Vec<Entry>,
}

/// Immutable, ordered list of entries. Order is the default display order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  entries: Vec<Entry>,
}

impl Catalog {
  /// Build a catalog, rejecting duplicate or zero ids, out-of-range ratings and zero episode counts.
  pub fn from_entries(entries: Vec<Entry>) -> Result<Self> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
      if entry.id == 0 {
        bail!("entry '{}' has id 0; ids must be positive", entry.title);
      }
      if !seen.insert(entry.id) {
        bail!("duplicate entry id {}", entry.id);
      }
      if !entry.rating.is_finite() || !(0.0..=10.0).contains(&entry.rating) {
        bail!("entry {} has rating {} outside 0.0-10.0", entry.id, entry.rating);
      }
      if entry.episodes == EpisodeCount::Count(0) {
        bail!("entry {} has an episode count of 0", entry.id);
      }
    }
    Ok(Self { entries })
  }

  /// The sample catalog embedded at compile time.
  pub fn builtin() -> Result<Self> {
    Self::from_json(include_str!("../catalog.json")).context("Embedded catalog.json is invalid")
  }

  pub fn from_json(json: &str) -> Result<Self> {
    let entries: Vec<Entry> = serde_json::from_str(json).context("Failed to parse JSON catalog")?;
    Self::from_entries(entries)
  }

  pub fn from_toml(text: &str) -> Result<Self> {
    let file: CatalogFile = toml::from_str(text).context("Failed to parse TOML catalog")?;
    Self::from_entries(file.entries)
  }

  /// Load an external catalog. The format is chosen by extension (`.json` or `.toml`).
  pub fn load(path: &Path) -> Result<Self> {
    let text =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
    let catalog = match ext.as_deref() {
      Some("json") => Self::from_json(&text),
      Some("toml") => Self::from_toml(&text),
      _ => bail!("Unsupported catalog format for {} (expected .json or .toml)", path.display()),
    };
    catalog.with_context(|| format!("Invalid catalog {}", path.display()))
  }

  pub fn entries(&self) -> &[Entry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn find(&self, id: u32) -> Option<&Entry> {
    self.entries.iter().find(|e| e.id == id)
  }

  /// Distinct lower-cased genres, in order of first appearance.
  pub fn genres(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in &self.entries {
      let genre = entry.genre.trim().to_lowercase();
      if !genre.is_empty() && !out.contains(&genre) {
        out.push(genre);
      }
    }
    out
  }
}
