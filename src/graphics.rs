use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Poster Widget ---

/// Draws a poster that was already scaled with [`fit_poster`] for the same area and mode.
pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

/// Scale and crop `image` to cover `area`. Half-block mode packs two pixel rows per cell.
pub fn fit_poster(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let w = u32::from(area.width.max(1));
  let h = match mode {
    DisplayMode::Direct => u32::from(area.height.max(1)) * 2,
    DisplayMode::Ascii | DisplayMode::Off => u32::from(area.height.max(1)),
  };
  image.resize_to_fill(w, h, FilterType::Triangle)
}

fn cell_position(area: Rect, x: u32, y: u32) -> (u16, u16) {
  (
    area.x.saturating_add(x.min(u16::MAX as u32) as u16),
    area.y.saturating_add(y.min(u16::MAX as u32) as u16),
  )
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(u32::from(area.width));
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(u32::from(area.height));

  for y in 0..rows {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if y * 2 + 1 < img_h {
        let lower = rgb.get_pixel(x, y * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell_position(area, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(u32::from(area.width));
  let img_h = luma.height().min(u32::from(area.height));

  for y in 0..img_h {
    for x in 0..img_w {
      let pixel = luma.get_pixel(x, y)[0];
      let idx = ((pixel as f32 / 255.0) * (ASCII_RAMP.len() - 1) as f32).round() as usize;
      let (cx, cy) = cell_position(area, x, y);
      buf.set_string(cx, cy, ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)], Style::default());
    }
  }
}
