//! Region records flowing through the visualization pipeline.

use image::{Rgb, RgbImage};
use ndarray::Array2;

use crate::contour::Annotation;

/// Binary segmentation mask, shape `(height, width)`, indexed `[(y, x)]`.
pub type Mask = Array2<bool>;

/// Axis-aligned box as `[x0, y0, x1, y1]` in pixel coordinates.
pub type BoxXyxy = [f32; 4];

/// One region as produced by the segmentation model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRegion {
    pub mask: Mask,
    /// Pixel count reported for the mask. Ranking uses this value as is.
    pub area: u64,
    pub score: Option<f32>,
    pub bbox: Option<BoxXyxy>,
    pub label: Option<String>,
}

impl RawRegion {
    pub fn new(mask: Mask, area: u64) -> Self {
        Self { mask, area, score: None, bbox: None, label: None }
    }

    /// Builds a region whose area is the number of `true` pixels in `mask`.
    pub fn from_mask(mask: Mask) -> Self {
        let area = foreground_pixels(&mask);
        Self::new(mask, area)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_box(mut self, bbox: BoxXyxy) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mask size as `(width, height)`, matching `image` conventions.
    pub fn dimensions(&self) -> (u32, u32) {
        let (h, w) = self.mask.dim();
        (w as u32, h as u32)
    }
}

pub fn foreground_pixels(mask: &Mask) -> u64 {
    mask.iter().filter(|&&v| v).count() as u64
}

/// A region after ranking, coloring and contour analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRegion {
    pub region: RawRegion,
    /// 0-based position in the ranked order; 0 is the largest region.
    pub rank: usize,
    pub color: Rgb<u8>,
    pub annotation: Annotation,
}

impl RankedRegion {
    /// Text drawn next to the region's centroid: the 1-based display number,
    /// followed by the label when there is one.
    pub fn display_label(&self) -> String {
        match &self.region.label {
            Some(label) if !label.is_empty() => format!("{} {}", self.rank + 1, label),
            _ => format!("{}", self.rank + 1),
        }
    }

    /// Caption drawn above the region's box, `None` when there is nothing to say.
    pub fn box_caption(&self) -> Option<String> {
        match (&self.region.label, self.region.score) {
            (Some(label), Some(score)) => Some(format!("{label} {score:.2}")),
            (Some(label), None) => Some(label.clone()),
            (None, Some(score)) => Some(format!("{score:.2}")),
            (None, None) => None,
        }
    }
}

/// Terminal output of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnnotatedOutput {
    /// Regions in draw order; later entries were painted on top of earlier ones.
    pub ranked_regions: Vec<RankedRegion>,
    pub composite_image: RgbImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(label: Option<&str>, score: Option<f32>) -> RankedRegion {
        let mut region = RawRegion::from_mask(Mask::from_elem((2, 2), true));
        region.label = label.map(str::to_string);
        region.score = score;
        RankedRegion { region, rank: 2, color: Rgb([1, 2, 3]), annotation: Annotation::default() }
    }

    #[test]
    fn from_mask_counts_foreground() {
        let mut mask = Mask::from_elem((3, 4), false);
        mask[(0, 0)] = true;
        mask[(2, 3)] = true;
        let region = RawRegion::from_mask(mask);
        assert_eq!(region.area, 2);
        assert_eq!(region.dimensions(), (4, 3));
    }

    #[test]
    fn display_label_is_one_based() {
        assert_eq!(ranked(None, None).display_label(), "3");
        assert_eq!(ranked(Some("cat"), None).display_label(), "3 cat");
        assert_eq!(ranked(Some(""), None).display_label(), "3");
    }

    #[test]
    fn box_caption_combines_label_and_score() {
        assert_eq!(ranked(Some("dog"), Some(0.871)).box_caption().as_deref(), Some("dog 0.87"));
        assert_eq!(ranked(None, Some(0.5)).box_caption().as_deref(), Some("0.50"));
        assert_eq!(ranked(None, None).box_caption(), None);
    }
}
