//! One visualization run: validate, rank, colorize, annotate, composite.
//!
//! Draw order is z-order. Regions are painted largest first, so smaller,
//! later-ranked regions stay visible on top of the larger ones beneath them.
//! The loop over ranked regions is sequential on purpose; reordering or
//! parallelising it changes the output.

use std::time::Instant;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    colors::ColorAllocator,
    compositor::{composite, OverlayStyle},
    contour::annotate,
    error::VizError,
    ranker::rank,
    region::{AnnotatedOutput, RankedRegion, RawRegion},
};

pub const DEFAULT_ALPHA: f32 = 0.4;

/// Tunables for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Fill opacity of each mask, within [0, 1].
    #[schema(example = 0.4, minimum = 0.0, maximum = 1.0)]
    pub alpha: f32,
    /// Color seed. Omit for a different palette on every run.
    #[schema(example = 42)]
    pub seed: Option<u64>,
    pub style: OverlayStyle,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, seed: None, style: OverlayStyle::default() }
    }
}

impl VisualizationConfig {
    pub fn validate(&self) -> Result<(), VizError> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(VizError::InvalidAlpha(self.alpha));
        }
        self.style.validate()
    }
}

/// The black-box segmentation model feeding the pipeline.
pub trait Segmenter {
    fn segment(&self, image: &RgbImage, prompt: Option<&str>) -> Result<Vec<RawRegion>, VizError>;
}

#[derive(Debug, Clone, Default)]
pub struct VisualizationPipeline {
    config: VisualizationConfig,
}

impl VisualizationPipeline {
    pub fn new(config: VisualizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    /// Renders `regions` over a copy of `image`.
    ///
    /// Every mask is checked against the image before anything is drawn; on
    /// error no canvas is returned.
    pub fn run(
        &self,
        image: &RgbImage,
        regions: Vec<RawRegion>,
    ) -> Result<AnnotatedOutput, VizError> {
        let started = Instant::now();
        self.config.validate()?;
        validate_dimensions(image, &regions)?;

        let ranked = self.prepare(rank(regions));

        let mut canvas = image.clone();
        for region in &ranked {
            composite(&mut canvas, region, self.config.alpha, &self.config.style)?;
        }

        info!(
            "visualize: {} regions on {}x{} in {} ms",
            ranked.len(),
            image.width(),
            image.height(),
            started.elapsed().as_millis()
        );
        Ok(AnnotatedOutput { ranked_regions: ranked, composite_image: canvas })
    }

    /// Asks `segmenter` for regions, then renders them.
    pub fn segment_and_run<S: Segmenter + ?Sized>(
        &self,
        segmenter: &S,
        image: &RgbImage,
        prompt: Option<&str>,
    ) -> Result<AnnotatedOutput, VizError> {
        let regions = segmenter.segment(image, prompt)?;
        debug!("segmenter returned {} regions (prompt={:?})", regions.len(), prompt);
        self.run(image, regions)
    }

    fn prepare(&self, ranked: Vec<RawRegion>) -> Vec<RankedRegion> {
        let mut colors = ColorAllocator::new(self.config.seed);
        ranked
            .into_iter()
            .enumerate()
            .map(|(rank, region)| {
                let color = colors.next_color();
                let annotation = annotate(&region.mask);
                if annotation.is_degenerate() {
                    warn!("region {rank} has an empty mask; skipping its label");
                } else {
                    debug!(
                        "region {rank}: area={} outlines={} centroid={:?}",
                        region.area,
                        annotation.outlines.len(),
                        annotation.centroid
                    );
                }
                RankedRegion { region, rank, color, annotation }
            })
            .collect()
    }
}

/// Renders with the default overlay style.
pub fn run(
    image: &RgbImage,
    regions: Vec<RawRegion>,
    alpha: f32,
    seed: Option<u64>,
) -> Result<AnnotatedOutput, VizError> {
    let config = VisualizationConfig { alpha, seed, ..VisualizationConfig::default() };
    VisualizationPipeline::new(config).run(image, regions)
}

fn validate_dimensions(image: &RgbImage, regions: &[RawRegion]) -> Result<(), VizError> {
    let expected = image.dimensions();
    for (index, region) in regions.iter().enumerate() {
        let found = region.dimensions();
        if found != expected {
            return Err(VizError::DimensionMismatch { index, expected, found });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::allocate;
    use crate::region::Mask;
    use image::Rgb;

    struct FixedSegmenter(Vec<RawRegion>);

    impl Segmenter for FixedSegmenter {
        fn segment(&self, _image: &RgbImage, _prompt: Option<&str>) -> Result<Vec<RawRegion>, VizError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSegmenter;

    impl Segmenter for FailingSegmenter {
        fn segment(&self, _image: &RgbImage, _prompt: Option<&str>) -> Result<Vec<RawRegion>, VizError> {
            Err(VizError::Segmenter("model unavailable".into()))
        }
    }

    fn square(size: usize, x0: usize, y0: usize, side: usize) -> RawRegion {
        RawRegion::from_mask(Mask::from_shape_fn((size, size), |(y, x)| {
            (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y)
        }))
    }

    #[test]
    fn default_config_uses_point_four_alpha() {
        let config = VisualizationConfig::default();
        assert_eq!(config.alpha, 0.4);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        let image = RgbImage::new(2, 2);
        for alpha in [-0.1, 1.01, f32::NAN] {
            let err = run(&image, Vec::new(), alpha, Some(1)).unwrap_err();
            assert!(matches!(err, VizError::InvalidAlpha(_)));
        }
    }

    #[test]
    fn oversized_style_fails_before_drawing() {
        let image = RgbImage::new(4, 4);
        let style = OverlayStyle { label_offset: 1 << 31, ..OverlayStyle::default() };
        let config = VisualizationConfig { style, ..VisualizationConfig::default() };
        let regions = vec![square(4, 0, 0, 2)];
        let err = VisualizationPipeline::new(config).run(&image, regions).unwrap_err();
        assert!(matches!(err, VizError::InvalidStyle(_)));
    }

    #[test]
    fn off_canvas_box_caption_does_not_abort_run() {
        let image = RgbImage::new(8, 8);
        let region = RawRegion::from_mask(Mask::from_elem((8, 8), false))
            .with_box([0.0, -3.0e9, 4.0, 4.0])
            .with_label("a");
        let out = run(&image, vec![region], 0.4, Some(1)).unwrap();
        assert_eq!(out.ranked_regions.len(), 1);
    }

    #[test]
    fn empty_region_set_returns_copy() {
        let image = RgbImage::from_pixel(3, 3, Rgb([9, 8, 7]));
        let out = run(&image, Vec::new(), 0.4, None).unwrap();
        assert!(out.ranked_regions.is_empty());
        assert_eq!(out.composite_image, image);
    }

    #[test]
    fn colors_follow_rank_order() {
        let image = RgbImage::new(8, 8);
        let regions = vec![square(8, 0, 0, 1), square(8, 2, 2, 4), square(8, 0, 6, 2)];
        let out = run(&image, regions, 0.4, Some(5)).unwrap();
        let areas: Vec<u64> = out.ranked_regions.iter().map(|r| r.region.area).collect();
        assert_eq!(areas, [16, 4, 1]);
        let ranks: Vec<usize> = out.ranked_regions.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [0, 1, 2]);
        let colors: Vec<Rgb<u8>> = out.ranked_regions.iter().map(|r| r.color).collect();
        assert_eq!(colors, allocate(3, Some(5)));
    }

    #[test]
    fn degenerate_mask_is_kept_without_centroid() {
        let image = RgbImage::new(4, 4);
        let regions = vec![RawRegion::from_mask(Mask::from_elem((4, 4), false)), square(4, 0, 0, 2)];
        let out = run(&image, regions, 0.4, Some(3)).unwrap();
        assert_eq!(out.ranked_regions.len(), 2);
        assert!(out.ranked_regions[1].annotation.centroid.is_none());
        assert!(out.ranked_regions[1].annotation.outlines.is_empty());
    }

    #[test]
    fn fixed_seed_renders_identically() {
        let image = RgbImage::from_pixel(16, 16, Rgb([30, 60, 90]));
        let regions = vec![square(16, 1, 1, 8), square(16, 6, 6, 9), square(16, 0, 12, 3)];
        let a = run(&image, regions.clone(), 0.4, Some(11)).unwrap();
        let b = run(&image, regions, 0.4, Some(11)).unwrap();
        assert_eq!(a.composite_image, b.composite_image);
        assert_eq!(a.ranked_regions, b.ranked_regions);
    }

    #[test]
    fn mismatch_reports_input_index() {
        let image = RgbImage::new(4, 4);
        let regions = vec![square(4, 0, 0, 1), square(5, 0, 0, 1)];
        let err = run(&image, regions, 0.4, None).unwrap_err();
        assert_eq!(err, VizError::DimensionMismatch { index: 1, expected: (4, 4), found: (5, 5) });
    }

    #[test]
    fn segment_and_run_uses_segmenter_output() {
        let image = RgbImage::new(6, 6);
        let segmenter = FixedSegmenter(vec![square(6, 0, 0, 2), square(6, 1, 1, 5)]);
        let pipeline = VisualizationPipeline::new(VisualizationConfig { seed: Some(2), ..Default::default() });
        let out = pipeline.segment_and_run(&segmenter, &image, Some("cup")).unwrap();
        assert_eq!(out.ranked_regions[0].region.area, 25);
        assert_eq!(out.ranked_regions[1].region.area, 4);
    }

    #[test]
    fn segmenter_failure_propagates() {
        let image = RgbImage::new(2, 2);
        let err = VisualizationPipeline::default().segment_and_run(&FailingSegmenter, &image, None).unwrap_err();
        assert_eq!(err, VizError::Segmenter("model unavailable".into()));
    }
}
