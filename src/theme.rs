use ratatui::style::Color;

/// Terminal color palette.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub badge_fg: Color,
  pub badge_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "sakura",
    bg: Color::Rgb(28, 24, 32),
    fg: Color::Rgb(236, 228, 240),
    accent: Color::Rgb(255, 107, 129),
    muted: Color::Rgb(140, 128, 150),
    border: Color::Rgb(78, 68, 90),
    highlight_fg: Color::Rgb(28, 24, 32),
    highlight_bg: Color::Rgb(255, 107, 129),
    badge_fg: Color::Rgb(255, 255, 255),
    badge_bg: Color::Rgb(60, 52, 70),
    status: Color::Rgb(255, 199, 119),
    error: Color::Rgb(255, 85, 85),
    key_fg: Color::Rgb(28, 24, 32),
    key_bg: Color::Rgb(200, 182, 220),
  },
  Theme {
    name: "midnight",
    bg: Color::Rgb(15, 18, 30),
    fg: Color::Rgb(214, 222, 235),
    accent: Color::Rgb(122, 162, 247),
    muted: Color::Rgb(110, 118, 140),
    border: Color::Rgb(52, 60, 86),
    highlight_fg: Color::Rgb(15, 18, 30),
    highlight_bg: Color::Rgb(122, 162, 247),
    badge_fg: Color::Rgb(236, 240, 250),
    badge_bg: Color::Rgb(40, 46, 70),
    status: Color::Rgb(224, 175, 104),
    error: Color::Rgb(247, 118, 142),
    key_fg: Color::Rgb(15, 18, 30),
    key_bg: Color::Rgb(169, 177, 214),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(40, 40, 46),
    accent: Color::Rgb(214, 48, 49),
    muted: Color::Rgb(128, 124, 118),
    border: Color::Rgb(206, 200, 190),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(214, 48, 49),
    badge_fg: Color::Rgb(250, 247, 240),
    badge_bg: Color::Rgb(60, 60, 66),
    status: Color::Rgb(176, 110, 20),
    error: Color::Rgb(190, 30, 45),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(90, 90, 98),
  },
];

/// Index of the theme called `name`, falling back to the first.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
