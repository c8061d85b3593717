use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Catalog, Entry};
use crate::pagination::Pager;
use crate::selection::{GenreFilter, normalize_query, select_indices};

/// How search results are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPolicy {
  /// While a query is active every match is shown at once and "load more" is unavailable.
  #[default]
  ShowAllWhileSearching,
  /// Search results page exactly like genre-only results.
  Paginate,
}

/// The browsing session's selection state: genre filter, search text, the current match
/// list, and how much of it is revealed.
///
/// Every mutation recomputes the match list before touching the pager, so
/// `revealed() <= match_count()` holds between calls.
#[derive(Debug, Clone)]
pub struct Session {
  catalog: Arc<Catalog>,
  filter: GenreFilter,
  query: String,
  /// Indices into the catalog, ascending.
  matched: Vec<usize>,
  pager: Pager,
  policy: RevealPolicy,
}

impl Session {
  /// Starts on the unfiltered first page.
  pub fn new(catalog: Arc<Catalog>, page_size: usize, policy: RevealPolicy) -> Self {
    let mut session = Self {
      catalog,
      filter: GenreFilter::All,
      query: String::new(),
      matched: Vec::new(),
      pager: Pager::new(page_size),
      policy,
    };
    session.rematch();
    session
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn filter(&self) -> &GenreFilter {
    &self.filter
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn policy(&self) -> RevealPolicy {
    self.policy
  }

  pub fn is_searching(&self) -> bool {
    normalize_query(&self.query).is_some()
  }

  pub fn match_count(&self) -> usize {
    self.matched.len()
  }

  pub fn revealed(&self) -> usize {
    self.pager.revealed()
  }

  pub fn has_more(&self) -> bool {
    self.pager.has_more(self.matched.len())
  }

  /// Change the genre filter. Prior reveal progress is discarded.
  pub fn select_genre(&mut self, filter: GenreFilter) {
    self.filter = filter;
    self.rematch();
  }

  /// Change the search text. Whitespace-only text behaves like an empty query.
  pub fn set_query(&mut self, text: &str) {
    self.query = text.to_string();
    self.rematch();
  }

  /// Drop the search text, falling back to the genre filter's first page.
  pub fn clear_query(&mut self) {
    self.set_query("");
  }

  /// Reveal the next page. Returns the number of newly visible entries.
  pub fn load_more(&mut self) -> usize {
    let added = self.pager.reveal_more(self.matched.len());
    debug!(added, revealed = self.pager.revealed(), matched = self.matched.len(), "session: load more");
    added
  }

  /// The revealed prefix of the match list, in catalog order.
  pub fn visible(&self) -> Vec<&Entry> {
    let entries = self.catalog.entries();
    self.matched.iter().take(self.pager.revealed()).map(|&i| &entries[i]).collect()
  }

  /// Look up any catalog entry by id, matched or not.
  pub fn find(&self, id: u32) -> Option<&Entry> {
    self.catalog.find(id)
  }

  fn rematch(&mut self) {
    self.matched = select_indices(self.catalog.entries(), &self.filter, &self.query);
    if self.is_searching() && self.policy == RevealPolicy::ShowAllWhileSearching {
      self.pager.reveal_all(self.matched.len());
    } else {
      self.pager.reset(self.matched.len());
    }
    debug!(
      filter = self.filter.token(),
      query = %self.query.trim(),
      matched = self.matched.len(),
      revealed = self.pager.revealed(),
      "session: rematched"
    );
  }
}
