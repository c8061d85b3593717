/// Progressive disclosure of a match list in fixed-size pages.
///
/// The pager never stores the match count; every transition is given the current count so
/// `revealed <= match_count` holds after each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  revealed: usize,
  page_size: usize,
}

impl Pager {
  /// A zero page size is clamped to 1.
  pub fn new(page_size: usize) -> Self {
    Self { revealed: 0, page_size: page_size.max(1) }
  }

  pub fn revealed(&self) -> usize {
    self.revealed
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Back to the first page.
  pub fn reset(&mut self, match_count: usize) {
    self.revealed = self.page_size.min(match_count);
  }

  /// Reveal the next page. Returns how many entries became visible (0 once exhausted).
  pub fn reveal_more(&mut self, match_count: usize) -> usize {
    let before = self.revealed.min(match_count);
    self.revealed = (before + self.page_size).min(match_count);
    self.revealed - before
  }

  /// Reveal every match at once.
  pub fn reveal_all(&mut self, match_count: usize) {
    self.revealed = match_count;
  }

  pub fn has_more(&self, match_count: usize) -> bool {
    self.revealed < match_count
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reset_clamps_to_match_count() {
    let mut pager = Pager::new(8);
    pager.reset(3);
    assert_eq!(pager.revealed(), 3);
    assert!(!pager.has_more(3));
    pager.reset(20);
    assert_eq!(pager.revealed(), 8);
    assert!(pager.has_more(20));
  }

  #[test]
  fn ten_matches_take_two_pages() {
    let mut pager = Pager::new(8);
    pager.reset(10);
    assert_eq!(pager.revealed(), 8);
    assert!(pager.has_more(10));
    assert_eq!(pager.reveal_more(10), 2);
    assert_eq!(pager.revealed(), 10);
    assert!(!pager.has_more(10));
  }

  #[test]
  fn reveal_more_is_noop_when_exhausted() {
    let mut pager = Pager::new(8);
    pager.reset(5);
    assert_eq!(pager.reveal_more(5), 0);
    assert_eq!(pager.revealed(), 5);
  }

  #[test]
  fn ceil_pages_reach_the_end() {
    for page_size in [1usize, 3, 8] {
      for count in 0usize..30 {
        let mut pager = Pager::new(page_size);
        pager.reset(count);
        // reset shows the first page; the remaining pages need ceil(count / page_size) - 1 reveals
        for _ in 1..count.div_ceil(page_size) {
          assert!(pager.has_more(count));
          pager.reveal_more(count);
        }
        assert_eq!(pager.revealed(), count, "page_size {page_size}, count {count}");
        assert!(!pager.has_more(count));
      }
    }
  }

  #[test]
  fn has_more_iff_not_fully_revealed() {
    let mut pager = Pager::new(4);
    pager.reset(9);
    while pager.has_more(9) {
      assert!(pager.revealed() < 9);
      pager.reveal_more(9);
    }
    assert_eq!(pager.revealed(), 9);
  }

  #[test]
  fn shrinking_match_count_never_over_reveals() {
    let mut pager = Pager::new(8);
    pager.reset(20);
    pager.reveal_more(20);
    assert_eq!(pager.reveal_more(5), 0);
    assert_eq!(pager.revealed(), 5);
  }

  #[test]
  fn reveal_all_shows_everything() {
    let mut pager = Pager::new(8);
    pager.reveal_all(30);
    assert_eq!(pager.revealed(), 30);
    assert!(!pager.has_more(30));
  }

  #[test]
  fn zero_page_size_is_clamped() {
    let mut pager = Pager::new(0);
    assert_eq!(pager.page_size(), 1);
    pager.reset(3);
    assert_eq!(pager.revealed(), 1);
  }
}
