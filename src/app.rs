use image::DynamicImage;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{Latency, Settings};
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::poster::{self, PosterResult, PosterState};
use crate::render::{self, Screen, Surface};
use crate::selection::GenreFilter;
use crate::session::Session;
use crate::theme::THEMES;

// --- Types ---

/// Everything a user can ask of the browser. `App::dispatch` is the only way state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
  GenreSelected(GenreFilter),
  QueryChanged(String),
  LoadMoreRequested,
  EntrySelected(u32),
  OverlayDismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Browse,
  Search,
  Detail,
}

/// Why a gallery redraw is pending; selects the simulated latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
  Filter,
  Search,
  LoadMore,
}

/// Resized posters keyed by `(entry id, width, height)`.
#[derive(Default)]
pub struct GraphicsCache {
  pub resized: HashMap<(u32, u16, u16), DynamicImage>,
}

/// In-flight async work.
pub(crate) struct AsyncTasks {
  /// The one deferred redraw that may still land. Replacing it drops the older receiver.
  pub(crate) render_rx: Option<(PendingKind, oneshot::Receiver<()>)>,
  pub(crate) poster_tx: mpsc::Sender<PosterResult>,
  pub(crate) poster_rx: mpsc::Receiver<PosterResult>,
}

impl Default for AsyncTasks {
  fn default() -> Self {
    let (poster_tx, poster_rx) = mpsc::channel(64);
    Self { render_rx: None, poster_tx, poster_rx }
  }
}

pub struct App {
  pub session: Session,
  pub screen: Screen,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  /// Genre chips, `All` first.
  pub genres: Vec<GenreFilter>,
  pub genre_index: usize,
  /// Search text being edited.
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  /// Card cursor, an index into the rendered gallery.
  pub selected: usize,
  /// Cards per row, written by the UI on each draw.
  pub grid_columns: usize,
  /// First visible card row, written by the UI on each draw.
  pub gallery_scroll: usize,
  pub posters: HashMap<u32, PosterState>,
  pub gfx: GraphicsCache,
  pub last_error: Option<String>,
  pub should_quit: bool,
  latency: Latency,
  http_client: Option<Client>,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set; used for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  /// Build the browser and draw the first page synchronously.
  pub fn new(settings: &Settings, catalog: Arc<Catalog>, display_mode: DisplayMode) -> Self {
    let genres = match settings.genres {
      Some(ref genres) => genres.clone(),
      None => std::iter::once(GenreFilter::All).chain(catalog.genres().iter().map(|g| GenreFilter::parse(g))).collect(),
    };
    let http_client = if display_mode.shows_posters() {
      match poster::http_client() {
        Ok(client) => Some(client),
        Err(e) => {
          warn!(err = %format!("{:#}", e), "posters disabled");
          None
        }
      }
    } else {
      None
    };
    info!(entries = catalog.len(), genres = genres.len(), display = display_mode.label(), "app: starting");

    let mut app = Self {
      session: Session::new(catalog, settings.page_size, settings.reveal_policy),
      screen: Screen::default(),
      mode: AppMode::Browse,
      theme_index: settings.theme_index.min(THEMES.len() - 1),
      display_mode,
      genres,
      genre_index: 0,
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      selected: 0,
      grid_columns: 1,
      gallery_scroll: 0,
      posters: HashMap::new(),
      gfx: GraphicsCache::default(),
      last_error: None,
      should_quit: false,
      latency: settings.latency,
      http_client,
      tasks: AsyncTasks::default(),
      error_time: None,
    };
    app.render_now();
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is clamped on construction and advanced modulo THEMES.len().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  pub fn is_loading(&self) -> bool {
    self.screen.loading
  }

  // --- Events ---

  pub fn dispatch(&mut self, event: UiEvent) {
    match event {
      UiEvent::GenreSelected(filter) => {
        info!(genre = filter.token(), "genre selected");
        if let Some(i) = self.genres.iter().position(|g| *g == filter) {
          self.genre_index = i;
        }
        self.session.select_genre(filter);
        self.reset_cursor();
        self.schedule_render(PendingKind::Filter);
      }
      UiEvent::QueryChanged(text) => {
        if self.input != text {
          self.cursor_position = text.chars().count();
          self.input = text;
        }
        self.session.set_query(&self.input);
        self.reset_cursor();
        // An emptied query falls back to the genre filter, with its latency.
        let kind = if self.session.is_searching() { PendingKind::Search } else { PendingKind::Filter };
        self.schedule_render(kind);
      }
      UiEvent::LoadMoreRequested => {
        if !self.session.has_more() {
          debug!("load more ignored: everything is revealed");
          return;
        }
        self.session.load_more();
        self.schedule_render(PendingKind::LoadMore);
      }
      UiEvent::EntrySelected(id) => {
        if render::render_detail(&self.session, id, &mut self.screen) {
          debug!(id, "detail opened");
          self.mode = AppMode::Detail;
          self.request_posters(&[id]);
        }
      }
      UiEvent::OverlayDismissed => {
        self.screen.dismiss_detail();
        if self.mode == AppMode::Detail {
          self.mode = AppMode::Browse;
        }
      }
    }
  }

  /// Redraw now, or after the simulated latency for `kind`. A later call supersedes an
  /// earlier pending one.
  fn schedule_render(&mut self, kind: PendingKind) {
    let delay = match kind {
      PendingKind::Filter => self.latency.filter,
      PendingKind::Search => self.latency.search,
      PendingKind::LoadMore => self.latency.load_more,
    };
    if delay.is_zero() {
      self.tasks.render_rx = None;
      self.render_now();
      return;
    }
    self.screen.set_loading(true);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = tx.send(());
    });
    self.tasks.render_rx = Some((kind, rx));
  }

  fn render_now(&mut self) {
    render::render_gallery(&self.session, &mut self.screen);
    self.screen.set_loading(false);
    let count = self.screen.gallery.cards().len();
    if self.selected >= count {
      self.selected = count.saturating_sub(1);
    }
    let ids: Vec<u32> = self.screen.gallery.cards().iter().map(|c| c.id).collect();
    self.request_posters(&ids);
  }

  pub fn check_pending(&mut self) {
    if let Some((kind, mut rx)) = self.tasks.render_rx.take() {
      match rx.try_recv() {
        Ok(()) => {
          debug!(?kind, "deferred render landed");
          self.render_now();
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.render_rx = Some((kind, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          warn!(?kind, "deferred render task vanished; rendering now");
          self.render_now();
        }
      }
    }

    while let Ok(result) = self.tasks.poster_rx.try_recv() {
      self.gfx.resized.retain(|(id, _, _), _| *id != result.id);
      match result.image {
        Ok(image) => {
          self.posters.insert(result.id, PosterState::Ready(image));
        }
        Err(e) => {
          self.posters.insert(result.id, PosterState::Failed);
          if self.screen.detail.as_ref().is_some_and(|d| d.id == result.id) {
            self.set_error(format!("Poster unavailable: {:#}", e));
          }
        }
      }
    }

    self.expire_error();
  }

  // --- Posters ---

  /// Start fetching posters for `ids` that are neither cached nor in flight.
  fn request_posters(&mut self, ids: &[u32]) {
    let Some(ref client) = self.http_client else { return };
    let mut requests = Vec::new();
    for &id in ids {
      if self.posters.contains_key(&id) {
        continue;
      }
      let Some(entry) = self.session.find(id) else { continue };
      if entry.image_url.trim().is_empty() {
        self.posters.insert(id, PosterState::Failed);
        continue;
      }
      self.posters.insert(id, PosterState::Loading);
      requests.push((id, entry.image_url.clone()));
    }
    if requests.is_empty() {
      return;
    }
    debug!(count = requests.len(), "posters: fetching");
    let client = client.clone();
    let tx = self.tasks.poster_tx.clone();
    tokio::spawn(poster::fetch_posters(client, requests, tx));
  }

  // --- Navigation ---

  fn reset_cursor(&mut self) {
    self.selected = 0;
    self.gallery_scroll = 0;
  }

  pub fn scroll_to_top(&mut self) {
    self.reset_cursor();
  }

  /// Move the card cursor. Stepping forward off the last card asks for the next page,
  /// once per drawn page: nothing more is requested while a redraw is pending.
  pub fn move_selection(&mut self, delta: isize) {
    let count = self.screen.gallery.cards().len();
    if count == 0 {
      return;
    }
    let target = self.selected as isize + delta;
    if target >= count as isize && self.session.has_more() && self.tasks.render_rx.is_none() {
      self.dispatch(UiEvent::LoadMoreRequested);
    }
    // an immediate redraw may have grown the gallery
    let count = self.screen.gallery.cards().len().max(1);
    self.selected = target.clamp(0, count as isize - 1) as usize;
  }

  pub fn move_row(&mut self, down: bool) {
    let step = self.grid_columns.max(1) as isize;
    self.move_selection(if down { step } else { -step });
  }

  pub fn selected_id(&self) -> Option<u32> {
    self.screen.gallery.cards().get(self.selected).map(|c| c.id)
  }

  pub fn open_selected(&mut self) {
    if let Some(id) = self.selected_id() {
      self.dispatch(UiEvent::EntrySelected(id));
    }
  }

  pub fn select_genre_at(&mut self, index: usize) {
    if let Some(filter) = self.genres.get(index).cloned() {
      self.dispatch(UiEvent::GenreSelected(filter));
    }
  }

  pub fn next_genre(&mut self) {
    if !self.genres.is_empty() {
      self.select_genre_at((self.genre_index + 1) % self.genres.len());
    }
  }

  pub fn prev_genre(&mut self) {
    if !self.genres.is_empty() {
      let len = self.genres.len();
      self.select_genre_at((self.genre_index + len - 1) % len);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::tests::entry;
  use crate::session::RevealPolicy;
  use crate::view::{EMPTY_HEADLINE, GalleryView};

  fn builtin_app() -> App {
    App::new(&Settings::immediate(), Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off)
  }

  fn card_ids(app: &App) -> Vec<u32> {
    app.screen.gallery.cards().iter().map(|c| c.id).collect()
  }

  fn ten_actions() -> Arc<Catalog> {
    let mut entries: Vec<_> = (1..=10).map(|i| entry(i, &format!("Brawl {i}"), "action", "Fists fly.")).collect();
    entries.push(entry(11, "Tea Time", "slice of life", "Calm."));
    Arc::new(Catalog::from_entries(entries).unwrap())
  }

  /// Poll until the deferred redraw lands.
  async fn settle(app: &mut App) {
    for _ in 0..400 {
      app.check_pending();
      if app.tasks.render_rx.is_none() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("deferred render never landed");
  }

  // --- immediate pipeline ---

  #[test]
  fn first_page_is_drawn_on_startup() {
    let app = builtin_app();
    assert_eq!(card_ids(&app), vec![1, 2, 3, 4, 6, 8, 9, 10]);
    assert!(app.screen.load_more);
    assert!(!app.is_loading());
    assert_eq!(app.genres[0], GenreFilter::All);
    assert_eq!(app.genres.len(), 5);
  }

  #[test]
  fn load_more_appends_and_hides_control() {
    let mut app = builtin_app();
    app.dispatch(UiEvent::LoadMoreRequested);
    assert_eq!(card_ids(&app), vec![1, 2, 3, 4, 6, 8, 9, 10, 12]);
    assert!(!app.screen.load_more);
    // exhausted: a further request changes nothing
    app.dispatch(UiEvent::LoadMoreRequested);
    assert_eq!(app.screen.gallery.cards().len(), 9);
  }

  #[test]
  fn ten_action_entries_page_eight_then_ten() {
    let mut app = App::new(&Settings::immediate(), ten_actions(), DisplayMode::Off);
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("action")));
    assert_eq!(app.session.revealed(), 8);
    assert!(app.screen.load_more);
    app.dispatch(UiEvent::LoadMoreRequested);
    assert_eq!(app.session.revealed(), 10);
    assert!(!app.screen.load_more);
    assert_eq!(card_ids(&app), (1..=10).collect::<Vec<_>>());
  }

  #[test]
  fn titan_search_finds_one_card() {
    let mut app = builtin_app();
    app.dispatch(UiEvent::QueryChanged("titan".to_string()));
    assert_eq!(card_ids(&app), vec![1]);
    assert!(!app.screen.load_more);
    assert_eq!(app.input, "titan");
  }

  #[test]
  fn empty_genre_shows_empty_state() {
    let mut app = App::new(&Settings::immediate(), ten_actions(), DisplayMode::Off);
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("horror")));
    match app.screen.gallery {
      GalleryView::Empty(ref empty) => assert_eq!(empty.headline, EMPTY_HEADLINE),
      ref other => panic!("expected empty state, got {:?}", other),
    }
    assert!(!app.screen.load_more);
    assert_eq!(app.selected_id(), None);
  }

  #[test]
  fn clearing_search_restores_paged_genre_view() {
    let mut app = App::new(&Settings::immediate(), ten_actions(), DisplayMode::Off);
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("action")));
    app.dispatch(UiEvent::QueryChanged("fists".to_string()));
    assert_eq!(app.screen.gallery.cards().len(), 10);
    assert!(!app.screen.load_more);
    app.dispatch(UiEvent::QueryChanged("   ".to_string()));
    assert_eq!(app.screen.gallery.cards().len(), 8);
    assert!(app.screen.load_more);
  }

  #[test]
  fn paginated_search_keeps_load_more() {
    let settings = Settings { reveal_policy: RevealPolicy::Paginate, ..Settings::immediate() };
    let mut app = App::new(&settings, ten_actions(), DisplayMode::Off);
    app.dispatch(UiEvent::QueryChanged("brawl".to_string()));
    assert_eq!(app.screen.gallery.cards().len(), 8);
    assert!(app.screen.load_more);
  }

  #[test]
  fn genre_change_resets_cursor_and_progress() {
    let mut app = builtin_app();
    app.dispatch(UiEvent::LoadMoreRequested);
    app.selected = 8;
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("comedy")));
    assert_eq!(card_ids(&app), vec![8, 12]);
    assert_eq!(app.selected, 0);
    assert_eq!(app.genre_index, 4);
  }

  // --- detail overlay ---

  #[test]
  fn unknown_entry_is_a_silent_noop() {
    let mut app = builtin_app();
    app.dispatch(UiEvent::EntrySelected(404));
    assert!(app.screen.detail.is_none());
    assert_eq!(app.mode, AppMode::Browse);
  }

  #[test]
  fn detail_opens_and_closes_idempotently() {
    let mut app = builtin_app();
    app.selected = 3;
    app.open_selected();
    assert_eq!(app.mode, AppMode::Detail);
    assert_eq!(app.screen.detail.as_ref().map(|d| d.id), Some(4));
    app.dispatch(UiEvent::OverlayDismissed);
    app.dispatch(UiEvent::OverlayDismissed);
    assert!(app.screen.detail.is_none());
    assert_eq!(app.mode, AppMode::Browse);
  }

  // --- navigation ---

  #[test]
  fn stepping_past_last_card_loads_more() {
    let mut app = builtin_app();
    app.selected = 7;
    app.move_selection(1);
    assert_eq!(app.screen.gallery.cards().len(), 9);
    assert_eq!(app.selected, 8);
    app.move_selection(1);
    assert_eq!(app.selected, 8);
  }

  #[test]
  fn row_moves_use_grid_columns() {
    let mut app = builtin_app();
    app.grid_columns = 3;
    app.move_row(true);
    assert_eq!(app.selected, 3);
    app.move_row(false);
    assert_eq!(app.selected, 0);
    app.move_row(false);
    assert_eq!(app.selected, 0);
  }

  #[test]
  fn genre_cycling_wraps() {
    let mut app = builtin_app();
    app.prev_genre();
    assert_eq!(app.genre_index, 4);
    assert_eq!(app.session.filter(), &GenreFilter::parse("comedy"));
    app.next_genre();
    assert_eq!(app.genre_index, 0);
    assert_eq!(app.session.filter(), &GenreFilter::All);
  }

  #[test]
  fn configured_genres_replace_catalog_genres() {
    let settings = Settings { genres: Some(vec![GenreFilter::All, GenreFilter::parse("act")]), ..Settings::immediate() };
    let mut app = App::new(&settings, Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off);
    assert_eq!(app.genres.len(), 2);
    app.select_genre_at(1);
    assert_eq!(card_ids(&app), vec![1, 3, 6, 9, 10]);
  }

  #[test]
  fn error_messages_clear() {
    let mut app = builtin_app();
    app.set_error("boom".to_string());
    app.expire_error();
    assert_eq!(app.last_error.as_deref(), Some("boom"));
    app.clear_error();
    assert!(app.last_error.is_none());
  }

  // --- deferred pipeline ---

  fn slow_settings() -> Settings {
    let ms = Duration::from_millis(20);
    Settings { latency: Latency { filter: ms, search: ms, load_more: ms }, ..Settings::immediate() }
  }

  #[tokio::test]
  async fn loading_shows_until_deferred_render_lands() {
    let mut app = App::new(&slow_settings(), Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off);
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("comedy")));
    assert!(app.is_loading());
    // the stale gallery stays until the redraw lands
    assert_eq!(app.screen.gallery.cards().len(), 8);
    settle(&mut app).await;
    assert!(!app.is_loading());
    assert_eq!(card_ids(&app), vec![8, 12]);
  }

  #[tokio::test]
  async fn last_request_wins() {
    let mut app = App::new(&slow_settings(), Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off);
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("comedy")));
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("romance")));
    app.dispatch(UiEvent::QueryChanged("your".to_string()));
    settle(&mut app).await;
    assert_eq!(card_ids(&app), vec![2]);
    // the superseded timers firing later change nothing
    tokio::time::sleep(Duration::from_millis(40)).await;
    app.check_pending();
    assert_eq!(card_ids(&app), vec![2]);
    assert!(!app.is_loading());
  }

  #[tokio::test]
  async fn held_cursor_reveals_one_page_per_redraw() {
    let entries: Vec<_> = (1..=30).map(|i| entry(i, &format!("Brawl {i}"), "action", "Fists fly.")).collect();
    let catalog = Arc::new(Catalog::from_entries(entries).unwrap());
    let mut app = App::new(&slow_settings(), catalog, DisplayMode::Off);
    app.selected = 7;
    for _ in 0..3 {
      app.move_selection(1);
    }
    assert_eq!(app.session.revealed(), 16);
    assert_eq!(app.selected, 7);
    settle(&mut app).await;
    assert_eq!(app.screen.gallery.cards().len(), 16);
    // the next page is requested only once the previous one is drawn
    app.move_selection(1);
    app.move_selection(1);
    assert_eq!(app.session.revealed(), 16);
    app.selected = 15;
    app.move_selection(1);
    assert_eq!(app.session.revealed(), 24);
  }

  #[tokio::test]
  async fn deferred_load_more_matches_immediate_result() {
    let mut slow = App::new(&slow_settings(), Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off);
    slow.dispatch(UiEvent::LoadMoreRequested);
    settle(&mut slow).await;
    let mut fast = builtin_app();
    fast.dispatch(UiEvent::LoadMoreRequested);
    assert_eq!(card_ids(&slow), card_ids(&fast));
    assert_eq!(slow.screen.load_more, fast.screen.load_more);
  }
}
