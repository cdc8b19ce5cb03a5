//! Alpha blending of region masks onto the shared canvas, plus the
//! full-opacity overlays (outline, label, box) drawn on top of each blend.

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, BresenhamLineIter},
    rect::Rect,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::VizError,
    label::{draw_text, text_visible},
    region::{BoxXyxy, Mask, RankedRegion},
};

/// Box captions sit this many pixels above the box's top edge.
const BOX_CAPTION_GAP: i64 = 10;

pub const MAX_OUTLINE_THICKNESS: u32 = 16;
pub const MAX_LABEL_SCALE: u32 = 16;
pub const MAX_LABEL_OFFSET: u32 = 4096;

/// Which overlays are drawn after the alpha blend, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OverlayStyle {
    /// Stroke width of mask outlines and boxes, in pixels.
    #[schema(example = 2, minimum = 1)]
    pub outline_thickness: u32,
    pub draw_outline: bool,
    /// Draw the rank number (and label) near each mask's centroid.
    pub draw_labels: bool,
    /// Draw boxes and their captions for regions that carry one.
    pub draw_boxes: bool,
    /// Integer upscale of the 8x8 label font.
    #[schema(example = 1, minimum = 1)]
    pub label_scale: u32,
    /// How far above the centroid the label baseline sits.
    #[schema(example = 4)]
    pub label_offset: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            outline_thickness: 2,
            draw_outline: true,
            draw_labels: true,
            draw_boxes: true,
            label_scale: 1,
            label_offset: 4,
        }
    }
}

impl OverlayStyle {
    /// Only the alpha blend; nothing is drawn at full opacity.
    pub fn fill_only() -> Self {
        Self { draw_outline: false, draw_labels: false, draw_boxes: false, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), VizError> {
        let checks = [
            ("outline_thickness", self.outline_thickness, 1, MAX_OUTLINE_THICKNESS),
            ("label_scale", self.label_scale, 1, MAX_LABEL_SCALE),
            ("label_offset", self.label_offset, 0, MAX_LABEL_OFFSET),
        ];
        for (field, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(VizError::InvalidStyle(format!("{field} must be within [{min}, {max}], got {value}")));
            }
        }
        Ok(())
    }
}

/// Blends `color` into every canvas pixel where `mask` is set:
/// `out = canvas * (1 - alpha) + color * alpha`, per channel.
///
/// Pixels outside the mask are untouched.
pub fn blend(canvas: &mut RgbImage, mask: &Mask, color: Rgb<u8>, alpha: f32) -> Result<(), VizError> {
    check_dimensions(canvas, mask, 0)?;
    let keep = 1.0 - alpha;
    for ((y, x), &on) in mask.indexed_iter() {
        if !on {
            continue;
        }
        let px = canvas.get_pixel_mut(x as u32, y as u32);
        for (c, k) in px.0.iter_mut().zip(color.0) {
            *c = (*c as f32 * keep + k as f32 * alpha).round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

/// Blends one ranked region into the canvas and draws its overlays.
///
/// Regions without a centroid (empty masks) get no label. Calls accumulate:
/// a later region paints over whatever earlier ones left. A size mismatch is
/// reported with `index` set to the region's rank.
pub fn composite(
    canvas: &mut RgbImage,
    region: &RankedRegion,
    alpha: f32,
    style: &OverlayStyle,
) -> Result<(), VizError> {
    check_dimensions(canvas, &region.region.mask, region.rank)?;
    blend(canvas, &region.region.mask, region.color, alpha)?;

    let thickness = style.outline_thickness.clamp(1, MAX_OUTLINE_THICKNESS);
    if style.draw_outline {
        for outline in &region.annotation.outlines {
            stroke_closed(canvas, outline, region.color, thickness);
        }
    }

    if style.draw_labels {
        if let Some((cx, cy)) = region.annotation.centroid {
            let baseline = cy as i64 - style.label_offset as i64;
            draw_text(canvas, &region.display_label(), cx as i64, baseline, style.label_scale, region.color);
        }
    }

    if style.draw_boxes {
        if let Some(bbox) = region.region.bbox {
            draw_box(canvas, bbox, region.color, thickness);
            if let Some(caption) = region.box_caption() {
                // f32 -> i64 saturates; non-finite boxes anchor nowhere visible
                let x0 = bbox[0].min(bbox[2]).round() as i64;
                let y0 = (bbox[1].min(bbox[3]).round() as i64).saturating_sub(BOX_CAPTION_GAP);
                let on_canvas = bbox.iter().all(|v| v.is_finite())
                    && text_visible(canvas, &caption, x0, y0, style.label_scale);
                if on_canvas {
                    draw_text(canvas, &caption, x0, y0, style.label_scale, region.color);
                }
            }
        }
    }
    Ok(())
}

fn check_dimensions(canvas: &RgbImage, mask: &Mask, index: usize) -> Result<(), VizError> {
    let (h, w) = mask.dim();
    let found = (w as u32, h as u32);
    let expected = canvas.dimensions();
    if found != expected {
        return Err(VizError::DimensionMismatch { index, expected, found });
    }
    Ok(())
}

/// Top-left offset of a `thickness`-wide square pen centred on the stroke.
fn pen_origin(thickness: u32) -> i32 {
    -((thickness as i32 - 1) / 2)
}

fn stroke_closed(canvas: &mut RgbImage, points: &[(u32, u32)], color: Rgb<u8>, thickness: u32) {
    let n = points.len();
    let origin = pen_origin(thickness);
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        let (start, end) = ((x0 as f32, y0 as f32), (x1 as f32, y1 as f32));
        if thickness == 1 {
            draw_line_segment_mut(canvas, start, end, color);
            continue;
        }
        for (x, y) in BresenhamLineIter::new(start, end) {
            let pen = Rect::at(x + origin, y + origin).of_size(thickness, thickness);
            draw_filled_rect_mut(canvas, pen, color);
        }
    }
}

fn draw_box(canvas: &mut RgbImage, bbox: BoxXyxy, color: Rgb<u8>, thickness: u32) {
    let (w, h) = canvas.dimensions();
    let clamp_x = |v: f32| v.round().clamp(0.0, w as f32 - 1.0) as i32;
    let clamp_y = |v: f32| v.round().clamp(0.0, h as f32 - 1.0) as i32;
    if w == 0 || h == 0 || !bbox.iter().all(|v| v.is_finite()) {
        return;
    }
    let (x0, x1) = (clamp_x(bbox[0].min(bbox[2])), clamp_x(bbox[0].max(bbox[2])));
    let (y0, y1) = (clamp_y(bbox[1].min(bbox[3])), clamp_y(bbox[1].max(bbox[3])));
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    for t in 0..thickness as i32 {
        let (rw, rh) = (x1 - x0 + 1 - 2 * t, y1 - y0 + 1 - 2 * t);
        if rw <= 0 || rh <= 0 {
            break;
        }
        draw_hollow_rect_mut(canvas, Rect::at(x0 + t, y0 + t).of_size(rw as u32, rh as u32), color);
    }
}
