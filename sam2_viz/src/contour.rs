//! Outline and centroid extraction for a single mask.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};

use crate::region::Mask;

/// Geometry used to decorate one region on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Closed polylines, `(x, y)` pixel coordinates, one per outer border.
    pub outlines: Vec<Vec<(u32, u32)>>,
    /// Mean position of the mask's `true` pixels, rounded to the nearest pixel.
    pub centroid: Option<(u32, u32)>,
}

impl Annotation {
    /// True when the mask had no foreground pixels.
    pub fn is_degenerate(&self) -> bool {
        self.centroid.is_none()
    }
}

/// Traces the outer borders of `mask` and computes its pixel-mass centroid.
///
/// Holes are not traced. An all-false mask yields no outlines and no centroid.
pub fn annotate(mask: &Mask) -> Annotation {
    let Some(centroid) = centroid(mask) else {
        return Annotation::default();
    };

    let outlines = find_contours::<i32>(&to_gray(mask))
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && !c.points.is_empty())
        .map(|c| c.points.iter().map(|p| (p.x as u32, p.y as u32)).collect())
        .collect();

    Annotation { outlines, centroid: Some(centroid) }
}

pub fn centroid(mask: &Mask) -> Option<(u32, u32)> {
    let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
    for ((y, x), &on) in mask.indexed_iter() {
        if on {
            sum_x += x as u64;
            sum_y += y as u64;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let cx = (sum_x as f64 / count as f64).round() as u32;
    let cy = (sum_y as f64 / count as f64).round() as u32;
    Some((cx, cy))
}

fn to_gray(mask: &Mask) -> GrayImage {
    let (h, w) = mask.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        if mask[(y as usize, x as usize)] { Luma([255]) } else { Luma([0]) }
    })
}
