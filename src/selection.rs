//! Which catalog entries match the active genre filter and search text.
//!
//! Everything here is a pure function over borrowed entries: results keep catalog order,
//! and no input is an error. An empty result is a valid "no matches" outcome.

use crate::catalog::Entry;

/// The active genre constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
  #[default]
  All,
  /// Token matched as a case-insensitive substring of the entry's genre. `parse` lower-cases it.
  Genre(String),
}

impl GenreFilter {
  /// `"all"` (any case) and blank tokens mean no constraint.
  pub fn parse(token: &str) -> Self {
    let token = token.trim().to_lowercase();
    if token.is_empty() || token == "all" { GenreFilter::All } else { GenreFilter::Genre(token) }
  }

  pub fn token(&self) -> &str {
    match self {
      GenreFilter::All => "all",
      GenreFilter::Genre(token) => token,
    }
  }

  /// Case-insensitive substring match, so partial tokens like "act" admit "Action".
  pub fn admits(&self, genre: &str) -> bool {
    match self {
      GenreFilter::All => true,
      GenreFilter::Genre(token) => genre.to_lowercase().contains(&token.to_lowercase()),
    }
  }
}

/// Trim and lower-case search text. Whitespace-only text means "no text constraint".
pub fn normalize_query(query: &str) -> Option<String> {
  let trimmed = query.trim();
  if trimmed.is_empty() { None } else { Some(trimmed.to_lowercase()) }
}

/// `needle` must already be normalized.
fn matches_needle(entry: &Entry, needle: &str) -> bool {
  entry.title.to_lowercase().contains(needle)
    || entry.description.to_lowercase().contains(needle)
    || entry.genre.to_lowercase().contains(needle)
}

/// Whether `entry` passes both constraints.
pub fn matches(entry: &Entry, filter: &GenreFilter, query: &str) -> bool {
  if !filter.admits(&entry.genre) {
    return false;
  }
  match normalize_query(query) {
    Some(needle) => matches_needle(entry, &needle),
    None => true,
  }
}

/// Indices of matching entries, ascending.
pub fn select_indices(entries: &[Entry], filter: &GenreFilter, query: &str) -> Vec<usize> {
  let needle = normalize_query(query);
  entries
    .iter()
    .enumerate()
    .filter(|(_, entry)| filter.admits(&entry.genre))
    .filter(|(_, entry)| needle.as_deref().is_none_or(|n| matches_needle(entry, n)))
    .map(|(i, _)| i)
    .collect()
}

/// Matching entries in catalog order.
pub fn select<'a>(entries: &'a [Entry], filter: &GenreFilter, query: &str) -> Vec<&'a Entry> {
  select_indices(entries, filter, query).into_iter().map(|i| &entries[i]).collect()
}
