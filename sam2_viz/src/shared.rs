use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{compositor::OverlayStyle, pipeline::VisualizationConfig};

/// One segmentation region as reported by the model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegionInput {
    /// Binary mask, one row per image row. Must match the image size exactly.
    #[schema(example = json!([[true, false], [false, false]]))]
    pub mask: Vec<Vec<bool>>,
    /// Model-reported pixel area. Counted from the mask when omitted.
    #[schema(example = 1)]
    pub area: Option<u64>,
    /// Model confidence for this region.
    #[schema(example = 0.92)]
    pub score: Option<f32>,
    /// Bounding box `[x0, y0, x1, y1]` in image pixels.
    #[serde(rename = "box")]
    #[schema(example = json!([0.0, 0.0, 1.0, 1.0]))]
    pub bbox: Option<[f32; 4]>,
    /// Phrase or class name attached to the region.
    #[schema(example = "dog")]
    pub label: Option<String>,
}

/// Request body for visualization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisualizeRequest {
    /// Optional client-supplied correlation ID. If not provided the server will generate one.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Option<Uuid>,
    /// Base64-encoded PNG or JPEG image the masks were computed on.
    #[schema(example = "<base64 PNG/JPEG data>")]
    pub image_b64: String,
    /// Regions to rank and draw, in model output order.
    pub regions: Vec<RegionInput>,
    /// Fill opacity (0..1). Server default when omitted.
    #[schema(example = 0.4, minimum = 0.0, maximum = 1.0)]
    pub alpha: Option<f32>,
    /// Color seed for reproducible palettes.
    #[schema(example = 42)]
    pub seed: Option<u64>,
    /// Overlay style. Server default when omitted.
    pub style: Option<OverlayStyle>,
}

/// A region after ranking, in draw order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegionResult {
    /// 0-based rank; 0 is the largest region and is drawn first.
    #[schema(example = 0)]
    pub rank: usize,
    #[schema(example = 1)]
    pub area: u64,
    #[schema(example = 0.92)]
    pub score: Option<f32>,
    #[serde(rename = "box")]
    #[schema(example = json!([0.0, 0.0, 1.0, 1.0]))]
    pub bbox: Option<[f32; 4]>,
    #[schema(example = "dog")]
    pub label: Option<String>,
    /// RGB color the region was drawn with.
    #[schema(example = json!([255, 128, 0]))]
    pub color: [u8; 3],
    /// Label anchor `[x, y]`; null for empty masks.
    #[schema(example = json!([0, 0]))]
    pub centroid: Option<[u32; 2]>,
    pub mask: Vec<Vec<bool>>,
}

/// Visualization result payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisualizeResponse {
    /// Echoed or generated request ID for tracing.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,
    #[schema(example = 640)]
    pub width: u32,
    #[schema(example = 480)]
    pub height: u32,
    /// Regions in ranked (draw) order.
    pub regions: Vec<RegionResult>,
    /// Source image with all masks, outlines and labels composited, as PNG.
    #[schema(example = "<base64 PNG>")]
    pub visualization_png_b64: String,
    /// Wall-clock render time in milliseconds.
    #[schema(example = 12)]
    pub render_ms: u128,
}

/// Defaults applied to fields a request leaves out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DefaultsResponse {
    pub defaults: VisualizationConfig,
}
