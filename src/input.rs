use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode, UiEvent};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Search => handle_search_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
  }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Char('/') => {
      app.clear_error();
      app.mode = AppMode::Search;
    }
    KeyCode::Tab => app.next_genre(),
    KeyCode::BackTab => app.prev_genre(),
    KeyCode::Char(c @ '1'..='9') => {
      let idx = c as usize - '1' as usize;
      app.select_genre_at(idx);
    }
    KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
    KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_row(false),
    KeyCode::Down | KeyCode::Char('j') => app.move_row(true),
    KeyCode::Enter => app.open_selected(),
    KeyCode::Char('m') | KeyCode::Char(' ') => app.dispatch(UiEvent::LoadMoreRequested),
    KeyCode::Home | KeyCode::Char('g') => app.scroll_to_top(),
    KeyCode::Char('q') => app.should_quit = true,
    KeyCode::Esc => {
      if app.input.is_empty() {
        app.should_quit = true;
      } else {
        clear_query(app);
      }
    }
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
      app.dispatch(UiEvent::QueryChanged(app.input.clone()));
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.dispatch(UiEvent::QueryChanged(app.input.clone()));
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.dispatch(UiEvent::QueryChanged(app.input.clone()));
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Enter | KeyCode::Down | KeyCode::Tab => {
      // Keep the query and go back to the gallery
      app.mode = AppMode::Browse;
    }
    KeyCode::Esc => {
      clear_query(app);
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
  if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')) {
    app.dispatch(UiEvent::OverlayDismissed);
  }
}

fn clear_query(app: &mut App) {
  app.input.clear();
  app.cursor_position = 0;
  app.input_scroll = 0;
  app.dispatch(UiEvent::QueryChanged(String::new()));
}
