//! Entry → view model. No terminal types here; any presentation layer can consume these.

use crate::catalog::{Entry, EpisodeCount};

pub const EMPTY_HEADLINE: &str = "No anime found";
pub const EMPTY_HINT: &str = "Try adjusting your search or filter criteria";

/// One gallery card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
  pub id: u32,
  pub image_url: String,
  pub status: &'static str,
  pub rating: String,
  pub title: String,
  pub blurb: String,
  pub year: String,
  pub episodes: String,
  pub genre: String,
}

/// The single-entry overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
  pub id: u32,
  pub image_url: String,
  pub title: String,
  pub rating: String,
  pub year: String,
  pub episodes: String,
  pub genre: String,
  pub status: &'static str,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
  pub headline: &'static str,
  pub hint: &'static str,
}

impl Default for EmptyState {
  fn default() -> Self {
    Self { headline: EMPTY_HEADLINE, hint: EMPTY_HINT }
  }
}

/// What the gallery region shows. There is no "empty list" variant: zero cards is `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryView {
  Cards(Vec<CardView>),
  Empty(EmptyState),
}

impl GalleryView {
  pub fn cards(&self) -> &[CardView] {
    match self {
      GalleryView::Cards(cards) => cards,
      GalleryView::Empty(_) => &[],
    }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, GalleryView::Empty(_))
  }
}

impl Default for GalleryView {
  fn default() -> Self {
    GalleryView::Empty(EmptyState::default())
  }
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Upper-case the first letter of each word ("slice of life" → "Slice Of Life").
pub fn capitalize(s: &str) -> String {
  s.split(' ')
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Counts get a unit; labels are shown verbatim.
pub fn episodes_text(episodes: &EpisodeCount) -> String {
  match episodes {
    EpisodeCount::Count(1) => "1 episode".to_string(),
    EpisodeCount::Count(n) => format!("{} episodes", n),
    EpisodeCount::Label(label) => label.clone(),
  }
}

pub fn card(entry: &Entry, blurb_chars: usize) -> CardView {
  CardView {
    id: entry.id,
    image_url: entry.image_url.clone(),
    status: entry.status.label(),
    rating: format!("★ {:.1}", entry.rating),
    title: entry.title.clone(),
    blurb: truncate_str(&entry.description, blurb_chars),
    year: entry.year.to_string(),
    episodes: episodes_text(&entry.episodes),
    genre: capitalize(&entry.genre),
  }
}

pub fn gallery(entries: &[&Entry], blurb_chars: usize) -> GalleryView {
  if entries.is_empty() {
    return GalleryView::Empty(EmptyState::default());
  }
  GalleryView::Cards(entries.iter().map(|e| card(e, blurb_chars)).collect())
}

pub fn detail(entry: &Entry) -> DetailView {
  DetailView {
    id: entry.id,
    image_url: entry.image_url.clone(),
    title: entry.title.clone(),
    rating: format!("{:.1}/10", entry.rating),
    year: entry.year.to_string(),
    episodes: episodes_text(&entry.episodes),
    genre: capitalize(&entry.genre),
    status: entry.status.label(),
    description: entry.description.clone(),
  }
}
