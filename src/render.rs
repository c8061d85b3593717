use std::time::{Duration, Instant};

use tracing::debug;

use crate::constants::constants;
use crate::session::Session;
use crate::view::{self, DetailView, GalleryView};

/// What the pipeline needs from a presentation layer.
pub trait Surface {
  /// Replace the whole gallery region.
  fn show_gallery(&mut self, gallery: GalleryView);
  fn set_loading(&mut self, loading: bool);
  fn set_load_more(&mut self, visible: bool);
  fn show_detail(&mut self, detail: DetailView);
  /// Closing an already-closed overlay does nothing.
  fn dismiss_detail(&mut self);
}

/// Project the session's revealed entries onto the surface, and keep the load-more
/// control in step with `has_more`.
pub fn render_gallery(session: &Session, surface: &mut impl Surface) {
  let visible = session.visible();
  let gallery = view::gallery(&visible, constants().blurb_chars);
  surface.show_gallery(gallery);
  surface.set_load_more(session.has_more());
}

/// Open the overlay for `id`. Unknown ids are ignored; returns whether an overlay was shown.
pub fn render_detail(session: &Session, id: u32, surface: &mut impl Surface) -> bool {
  let Some(entry) = session.find(id) else {
    debug!(id, "render: detail requested for unknown id");
    return false;
  };
  surface.show_detail(view::detail(entry));
  true
}

/// Terminal-side surface state, read by `ui` on every frame.
#[derive(Debug)]
pub struct Screen {
  pub gallery: GalleryView,
  pub loading: bool,
  pub load_more: bool,
  pub detail: Option<DetailView>,
  /// When the gallery was last replaced; drives the staggered card fade-in.
  pub gallery_shown_at: Instant,
}

impl Default for Screen {
  fn default() -> Self {
    Self {
      gallery: GalleryView::default(),
      loading: false,
      load_more: false,
      detail: None,
      gallery_shown_at: Instant::now(),
    }
  }
}

impl Screen {
  /// Whether card `index` has finished fading in at `now`.
  pub fn card_revealed(&self, index: usize, now: Instant) -> bool {
    let step = Duration::from_millis(constants().fade_step_ms);
    let due = self.gallery_shown_at + step.saturating_mul(index.min(u32::MAX as usize) as u32);
    now >= due
  }
}

impl Surface for Screen {
  fn show_gallery(&mut self, gallery: GalleryView) {
    self.gallery = gallery;
    self.gallery_shown_at = Instant::now();
  }

  fn set_loading(&mut self, loading: bool) {
    self.loading = loading;
  }

  fn set_load_more(&mut self, visible: bool) {
    self.load_more = visible;
  }

  fn show_detail(&mut self, detail: DetailView) {
    self.detail = Some(detail);
  }

  fn dismiss_detail(&mut self) {
    self.detail = None;
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::catalog::Catalog;
  use crate::selection::GenreFilter;
  use crate::session::RevealPolicy;
  use crate::view::EMPTY_HEADLINE;
  use std::sync::Arc;

  /// Records every surface call in order.
  #[derive(Debug, Default)]
  pub(crate) struct RecordingSurface {
    pub(crate) calls: Vec<String>,
    pub(crate) gallery: Option<GalleryView>,
    pub(crate) detail: Option<DetailView>,
    pub(crate) load_more: Option<bool>,
  }

  impl Surface for RecordingSurface {
    fn show_gallery(&mut self, gallery: GalleryView) {
      self.calls.push(format!("gallery:{}", gallery.cards().len()));
      self.gallery = Some(gallery);
    }
    fn set_loading(&mut self, loading: bool) {
      self.calls.push(format!("loading:{}", loading));
    }
    fn set_load_more(&mut self, visible: bool) {
      self.calls.push(format!("load_more:{}", visible));
      self.load_more = Some(visible);
    }
    fn show_detail(&mut self, detail: DetailView) {
      self.calls.push(format!("detail:{}", detail.id));
      self.detail = Some(detail);
    }
    fn dismiss_detail(&mut self) {
      self.calls.push("dismiss".to_string());
      self.detail = None;
    }
  }

  fn session() -> Session {
    Session::new(Arc::new(Catalog::builtin().unwrap()), 8, RevealPolicy::default())
  }

  #[test]
  fn gallery_tracks_has_more() {
    let mut surface = RecordingSurface::default();
    let mut s = session();
    render_gallery(&s, &mut surface);
    assert_eq!(surface.calls, vec!["gallery:8", "load_more:true"]);
    s.load_more();
    render_gallery(&s, &mut surface);
    assert_eq!(surface.load_more, Some(false));
    assert_eq!(surface.gallery.as_ref().map(|g| g.cards().len()), Some(9));
  }

  #[test]
  fn zero_matches_render_empty_state_and_hide_load_more() {
    let mut surface = RecordingSurface::default();
    let mut s = session();
    s.select_genre(GenreFilter::parse("horror"));
    render_gallery(&s, &mut surface);
    match surface.gallery {
      Some(GalleryView::Empty(ref empty)) => assert_eq!(empty.headline, EMPTY_HEADLINE),
      ref other => panic!("expected empty state, got {:?}", other),
    }
    assert_eq!(surface.load_more, Some(false));
  }

  #[test]
  fn unknown_detail_id_is_silent() {
    let mut surface = RecordingSurface::default();
    assert!(!render_detail(&session(), 5, &mut surface));
    assert!(surface.calls.is_empty());
  }

  #[test]
  fn known_detail_id_opens_overlay() {
    let mut surface = RecordingSurface::default();
    assert!(render_detail(&session(), 4, &mut surface));
    assert_eq!(surface.detail.as_ref().map(|d| d.title.as_str()), Some("Spirited Away"));
  }

  #[test]
  fn screen_dismiss_is_idempotent() {
    let mut screen = Screen::default();
    screen.dismiss_detail();
    assert!(screen.detail.is_none());
    render_detail(&session(), 1, &mut screen);
    assert!(screen.detail.is_some());
    screen.dismiss_detail();
    screen.dismiss_detail();
    assert!(screen.detail.is_none());
  }

  #[test]
  fn cards_fade_in_one_step_apart() {
    let screen = Screen::default();
    let start = screen.gallery_shown_at;
    let step = Duration::from_millis(constants().fade_step_ms);
    assert!(screen.card_revealed(0, start));
    assert!(!screen.card_revealed(3, start + step * 2));
    assert!(screen.card_revealed(3, start + step * 3));
  }
}
