use thiserror::Error;

/// Failures raised by the visualization core.
///
/// A failed run never hands back a canvas, so callers can map any of these
/// straight to an error response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VizError {
    /// A region's mask is not the same size as the source image.
    /// Dimensions are reported as `(width, height)`. `index` is the position in
    /// the input sequence when raised by pipeline validation, and the region's
    /// rank when raised by `compositor::composite`.
    #[error("mask {index} is {found:?} but the image is {expected:?} (width, height)")]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("alpha must be a finite value within [0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("invalid overlay style: {0}")]
    InvalidStyle(String),
    #[error("segmenter failed: {0}")]
    Segmenter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_reports_both_sizes() {
        let err = VizError::DimensionMismatch { index: 2, expected: (640, 480), found: (320, 240) };
        let msg = err.to_string();
        assert!(msg.contains("mask 2"));
        assert!(msg.contains("(640, 480)"));
        assert!(msg.contains("(320, 240)"));
    }

    #[test]
    fn invalid_style_display() {
        let err = VizError::InvalidStyle("label_scale must be within [1, 16], got 0".into());
        assert!(err.to_string().starts_with("invalid overlay style"));
    }

    #[test]
    fn invalid_alpha_display() {
        assert!(VizError::InvalidAlpha(1.5).to_string().contains("1.5"));
    }
}
