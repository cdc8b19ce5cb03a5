//! Bitmap text for region labels.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

/// Glyph cell edge in pixels at scale 1.
pub const GLYPH_SIZE: u32 = 8;

pub fn text_width(text: &str, scale: u32) -> u64 {
    text.chars().count() as u64 * GLYPH_SIZE as u64 * scale.max(1) as u64
}

/// Whether any part of the text cell anchored at `(x, baseline_y)` lands on the canvas.
pub fn text_visible(canvas: &RgbImage, text: &str, x: i64, baseline_y: i64, scale: u32) -> bool {
    let height = GLYPH_SIZE as i64 * scale.max(1) as i64;
    let right = x.saturating_add(text_width(text, scale) as i64);
    let top = baseline_y.saturating_sub(height);
    right > 0 && x < canvas.width() as i64 && baseline_y > 0 && top < canvas.height() as i64
}

/// Draws `text` with its bottom-left corner at `(x, baseline_y)`.
///
/// Pixels falling outside the canvas are dropped; the text is never moved to
/// fit. Characters missing from the font render as `?`.
pub fn draw_text(canvas: &mut RgbImage, text: &str, x: i64, baseline_y: i64, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1) as i64;
    let cell = GLYPH_SIZE as i64 * scale;
    let top = baseline_y.saturating_sub(cell);
    let width = canvas.width() as i64;
    for (i, ch) in text.chars().enumerate() {
        let origin_x = x.saturating_add((i as i64).saturating_mul(cell));
        if origin_x >= width {
            break;
        }
        if origin_x.saturating_add(cell) <= 0 {
            continue;
        }
        let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')).unwrap_or([0; 8]);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE as i64 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x.saturating_add(col * scale);
                let py = top.saturating_add(row as i64 * scale);
                fill_block(canvas, px, py, scale, color);
            }
        }
    }
}

fn fill_block(canvas: &mut RgbImage, x: i64, y: i64, size: i64, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    for py in y.max(0)..y.saturating_add(size).min(h) {
        for px in x.max(0)..x.saturating_add(size).min(w) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}
