use std::collections::HashMap;
use std::time::Instant;

use image::DynamicImage;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, GraphicsCache};
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::{PosterWidget, fit_poster};
use crate::poster::PosterState;
use crate::theme::Theme;
use crate::view::{CardView, DetailView, EmptyState, GalleryView, capitalize, truncate_str};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// A rectangle of `percent_x` × `percent_y` centred in `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
  let [_, mid, _] = Layout::vertical([
    Constraint::Percentage((100 - percent_y) / 2),
    Constraint::Percentage(percent_y),
    Constraint::Percentage((100 - percent_y) / 2),
  ])
  .areas(area);
  let [_, center, _] = Layout::horizontal([
    Constraint::Percentage((100 - percent_x) / 2),
    Constraint::Percentage(percent_x),
    Constraint::Percentage((100 - percent_x) / 2),
  ])
  .areas(mid);
  center
}

/// Resized poster for `id` at `area`, cached per size. `None` until the poster is ready.
fn poster_image<'a>(
  gfx: &'a mut GraphicsCache,
  posters: &HashMap<u32, PosterState>,
  id: u32,
  area: Rect,
  mode: DisplayMode,
) -> Option<&'a DynamicImage> {
  let Some(PosterState::Ready(original)) = posters.get(&id) else { return None };
  Some(gfx.resized.entry((id, area.width, area.height)).or_insert_with(|| fit_poster(original, area, mode)))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, genre_area, gallery_area, more_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_genres(frame, app, genre_area);
  render_gallery(frame, app, gallery_area);
  render_load_more(frame, app, more_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if let Some(detail) = app.screen.detail.clone() {
    render_detail(frame, app, &detail, gallery_area);
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ◆ animegrid ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: (version.len() as u16).min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_genres(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let active = app.session.filter();
  let mut spans = vec![Span::raw(" ")];
  for (i, genre) in app.genres.iter().enumerate() {
    let label = if i < 9 {
      format!(" {} {} ", i + 1, capitalize(genre.token()))
    } else {
      format!(" {} ", capitalize(genre.token()))
    };
    let style = if genre == active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg).bg(theme.badge_bg)
    };
    spans.push(Span::styled(label, style));
    spans.push(Span::raw(" "));
  }
  frame.render_widget(Line::from(spans), area);
}

fn render_gallery(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let title = if app.session.is_searching() {
    format!(" Results for '{}' ({}) ", app.session.query().trim(), app.session.match_count())
  } else {
    format!(" {} ({} of {}) ", capitalize(app.session.filter().token()), app.session.revealed(), app.session.match_count())
  };
  let block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  if let GalleryView::Empty(empty) = &app.screen.gallery {
    render_empty(frame, theme, empty, inner);
    return;
  }
  render_cards(frame, app, inner);
}

fn render_empty(frame: &mut Frame, theme: &Theme, empty: &EmptyState, area: Rect) {
  let top = area.height.saturating_sub(5) / 2;
  let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
  lines.push(Line::from(Span::styled("⌕", Style::default().fg(theme.muted))));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(empty.headline, Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))));
  lines.push(Line::from(Span::styled(empty.hint, Style::default().fg(theme.muted))));
  frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_cards(frame: &mut Frame, app: &mut App, area: Rect) {
  let c = constants();
  let cols = (area.width / c.card_width).max(1) as usize;
  let rows = (area.height / c.card_height).max(1) as usize;
  app.grid_columns = cols;

  // Keep the selected card's row on screen
  let selected_row = app.selected / cols;
  if selected_row < app.gallery_scroll {
    app.gallery_scroll = selected_row;
  } else if selected_row >= app.gallery_scroll + rows {
    app.gallery_scroll = selected_row + 1 - rows;
  }

  let cards = app.screen.gallery.cards();
  let start = (app.gallery_scroll * cols).min(cards.len());
  let end = (start + rows * cols).min(cards.len());
  let page: Vec<CardView> = cards[start..end].to_vec();
  let now = Instant::now();

  for (offset, card) in page.iter().enumerate() {
    let index = start + offset;
    let col = (offset % cols) as u16;
    let row = (offset / cols) as u16;
    let rect = Rect {
      x: area.x + col * c.card_width,
      y: area.y + row * c.card_height,
      width: c.card_width.min(area.width),
      height: c.card_height.min(area.height),
    }
    .intersection(area);
    let revealed = app.screen.card_revealed(index, now);
    render_card(frame, app, card, rect, index == app.selected, revealed);
  }
}

fn render_card(frame: &mut Frame, app: &mut App, card: &CardView, area: Rect, selected: bool, revealed: bool) {
  let theme = app.theme();
  let fg = if revealed { theme.fg } else { theme.muted };
  let border = if selected { theme.accent } else { theme.border };
  let block = Block::bordered()
    .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  frame.render_widget(block, area);
  if inner.is_empty() {
    return;
  }

  let poster_rows = constants().poster_rows.min(inner.height);
  let [poster_area, text_area] =
    Layout::vertical([Constraint::Length(poster_rows), Constraint::Min(0)]).areas(inner);

  render_poster_slot(frame, app, card.id, poster_area, revealed);

  // Badges over the poster
  let status = format!(" {} ", card.status);
  let status_w = (status.chars().count() as u16).min(poster_area.width);
  frame.render_widget(
    Span::styled(status, Style::default().fg(theme.badge_fg).bg(theme.badge_bg)),
    Rect { x: poster_area.right().saturating_sub(status_w), width: status_w, height: 1, ..poster_area },
  );
  if poster_area.height > 1 {
    let rating = format!(" {} ", card.rating);
    frame.render_widget(
      Span::styled(
        rating,
        Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD),
      ),
      Rect { y: poster_area.bottom() - 1, height: 1, ..poster_area },
    );
  }

  let w = text_area.width as usize;
  let mut lines = vec![Line::from(Span::styled(
    truncate_str(&card.title, w),
    Style::default().fg(fg).add_modifier(Modifier::BOLD),
  ))];
  // Two-line blurb
  let blurb: Vec<char> = card.blurb.chars().collect();
  for chunk in blurb.chunks(w.max(1)).take(2) {
    lines.push(Line::from(Span::styled(chunk.iter().collect::<String>(), Style::default().fg(theme.muted))));
  }
  lines.push(Line::from(vec![
    Span::styled(card.year.clone(), Style::default().fg(fg)),
    Span::styled("  ▶ ", Style::default().fg(theme.muted)),
    Span::styled(card.episodes.clone(), Style::default().fg(fg)),
  ]));
  lines.push(Line::from(Span::styled(format!(" {} ", card.genre), Style::default().fg(theme.fg).bg(theme.badge_bg))));
  frame.render_widget(Paragraph::new(lines), text_area);
}

/// The poster image if ready, otherwise a textured placeholder.
fn render_poster_slot(frame: &mut Frame, app: &mut App, id: u32, area: Rect, revealed: bool) {
  if area.is_empty() {
    return;
  }
  let theme = app.theme();
  let mode = app.display_mode;
  if revealed && let Some(image) = poster_image(&mut app.gfx, &app.posters, id, area, mode) {
    frame.render_widget(PosterWidget { image, display_mode: mode }, area);
    return;
  }
  let note = match app.posters.get(&id) {
    Some(PosterState::Loading) => "loading…",
    Some(PosterState::Failed) => "no image",
    _ => "",
  };
  let fill: Vec<Line> = (0..area.height)
    .map(|row| {
      if row == area.height / 2 && !note.is_empty() {
        Line::from(Span::styled(note, Style::default().fg(theme.muted)))
      } else {
        Line::from(Span::styled("░".repeat(area.width as usize), Style::default().fg(theme.border)))
      }
    })
    .collect();
  frame.render_widget(Paragraph::new(fill).alignment(Alignment::Center), area);
}

fn render_load_more(frame: &mut Frame, app: &App, area: Rect) {
  if !app.screen.load_more {
    return;
  }
  let theme = app.theme();
  let remaining = app.session.match_count().saturating_sub(app.session.revealed());
  let line = Line::from(Span::styled(
    format!(" ▼ Load more ({} left) · m ", remaining),
    Style::default().fg(theme.key_fg).bg(theme.accent).add_modifier(Modifier::BOLD),
  ));
  frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if app.screen.loading {
    (" ⏳ Loading…".to_string(), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.session.match_count() == 0 {
    (" Nothing matches".to_string(), Style::default().fg(theme.muted))
  } else {
    (
      format!(" Showing {} of {} · {} in catalog", app.session.revealed(), app.session.match_count(), app.session.catalog().len()),
      Style::default().fg(theme.muted),
    )
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let editing = app.mode == AppMode::Search;
  let border_color = if editing { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search anime ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  if app.input.is_empty() && !editing {
    let hint = Paragraph::new("Press / to search titles, descriptions and genres")
      .style(Style::default().fg(theme.muted))
      .block(input_block);
    frame.render_widget(hint, area);
    return;
  }

  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if editing {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Browse => {
      let mut k = vec![("Tab/1-9", "Genre"), ("/", "Search"), ("Enter", "Details")];
      if app.screen.load_more {
        k.push(("m", "More"));
      }
      k.push(("g", "Top"));
      k.push(("^t", "Theme"));
      k.push(("Esc", if app.input.is_empty() { "Quit" } else { "Clear" }));
      k
    }
    AppMode::Search => vec![("Enter", "Done"), ("Esc", "Clear")],
    AppMode::Detail => vec![("Esc", "Close")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: (theme_label.len() as u16).min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_detail(frame: &mut Frame, app: &mut App, detail: &DetailView, area: Rect) {
  let theme = app.theme();
  let overlay = centered(area, 80, 80);
  frame.render_widget(Clear, overlay);

  let block = Block::bordered()
    .title(Line::from(Span::styled(
      format!(" {} ", detail.title),
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    )))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1));
  let inner = block.inner(overlay);
  frame.render_widget(block, overlay);

  let show_poster = app.display_mode.shows_posters() && inner.width >= 40;
  let [poster_area, info_area] = if show_poster {
    Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(inner)
  } else {
    Layout::horizontal([Constraint::Length(0), Constraint::Min(0)]).areas(inner)
  };
  if show_poster {
    render_poster_slot(frame, app, detail.id, poster_area, true);
  }

  let label = |s: &'static str| Span::styled(s, Style::default().fg(theme.muted));
  let value = |s: String| Span::styled(s, Style::default().fg(theme.fg));
  let lines = vec![
    Line::from(Span::styled(detail.title.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(vec![
      Span::styled("★ ", Style::default().fg(theme.status)),
      value(detail.rating.clone()),
      label("   Year "),
      value(detail.year.clone()),
    ]),
    Line::from(vec![label("Episodes  "), value(detail.episodes.clone())]),
    Line::from(vec![label("Genre     "), value(detail.genre.clone())]),
    Line::from(vec![label("Status    "), value(detail.status.to_string())]),
    Line::from(""),
    Line::from(value(detail.description.clone())),
  ];
  let info = Rect { x: info_area.x + u16::from(show_poster), width: info_area.width.saturating_sub(1), ..info_area };
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::UiEvent;
  use crate::catalog::Catalog;
  use crate::config::Settings;
  use crate::selection::GenreFilter;
  use ratatui::{Terminal, backend::TestBackend};
  use std::sync::Arc;

  fn draw(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| ui(frame, app)).unwrap();
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..height {
      for x in 0..width {
        out.push_str(buffer[(x, y)].symbol());
      }
      out.push('\n');
    }
    out
  }

  fn app() -> App {
    App::new(&Settings::immediate(), Arc::new(Catalog::builtin().unwrap()), DisplayMode::Off)
  }

  // --- display_width ---

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("abc", 3), 3);
    assert_eq!(display_width("日本", 2), 4);
    assert_eq!(display_width("a日b", 2), 3);
  }

  // --- frames ---

  #[test]
  fn gallery_shows_first_cards_and_load_more() {
    let mut app = app();
    let screen = draw(&mut app, 120, 50);
    assert!(screen.contains("Attack on Titan"));
    assert!(screen.contains("Load more"));
    assert!(screen.contains("Showing 8 of 9"));
    assert_eq!(app.grid_columns, 3);
  }

  #[test]
  fn empty_state_is_drawn() {
    let mut app = app();
    app.dispatch(UiEvent::GenreSelected(GenreFilter::parse("horror")));
    let screen = draw(&mut app, 120, 50);
    assert!(screen.contains("No anime found"));
    assert!(screen.contains("Try adjusting your search or filter criteria"));
    assert!(!screen.contains("Load more"));
  }

  #[test]
  fn loading_indicator_differs_from_empty_state() {
    let mut app = app();
    app.screen.loading = true;
    let screen = draw(&mut app, 120, 50);
    assert!(screen.contains("Loading"));
    assert!(!screen.contains("No anime found"));
  }

  #[test]
  fn detail_overlay_is_drawn() {
    let mut app = app();
    app.dispatch(UiEvent::EntrySelected(4));
    let screen = draw(&mut app, 120, 50);
    assert!(screen.contains("9.3/10"));
    assert!(screen.contains("gods and witches"));
  }

  #[test]
  fn selection_scrolls_into_view() {
    let mut app = app();
    app.dispatch(UiEvent::LoadMoreRequested);
    app.selected = 8;
    draw(&mut app, 120, 34);
    // one row of three cards fits: the ninth card is on row 2
    assert_eq!(app.gallery_scroll, 2);
  }

  #[test]
  fn narrow_input_keeps_cursor_in_range() {
    let mut app = app();
    app.mode = AppMode::Search;
    app.dispatch(UiEvent::QueryChanged("titan".to_string()));
    let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
    for width in [4u16, 3, 1] {
      terminal.draw(|frame| render_input(frame, &mut app, Rect::new(0, 0, width, 3))).unwrap();
      assert!(app.input_scroll <= display_width(&app.input, app.cursor_position));
    }
  }

  #[test]
  fn search_text_is_shown() {
    let mut app = app();
    app.mode = AppMode::Search;
    app.dispatch(UiEvent::QueryChanged("titan".to_string()));
    let screen = draw(&mut app, 120, 50);
    assert!(screen.contains("Results for 'titan' (1)"));
  }
}
