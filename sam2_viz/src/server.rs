use std::{sync::Arc, time::Instant};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use image::{DynamicImage, RgbImage};
use tokio::sync::Semaphore;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::{
    compositor::OverlayStyle,
    config::ServerConfig,
    error::VizError,
    pipeline::{VisualizationConfig, VisualizationPipeline},
    region::{AnnotatedOutput, Mask, RankedRegion, RawRegion},
    shared::{DefaultsResponse, RegionInput, RegionResult, VisualizeRequest, VisualizeResponse},
};

#[derive(Clone)]
pub struct AppState {
    defaults: Arc<VisualizationConfig>,
    render_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(defaults: VisualizationConfig, max_concurrent_renders: usize) -> Self {
        Self {
            defaults: Arc::new(defaults),
            render_slots: Arc::new(Semaphore::new(max_concurrent_renders.max(1))),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<VizError> for AppError {
    fn from(err: VizError) -> Self {
        match err {
            VizError::Segmenter(_) => AppError::Internal(err.to_string()),
            VizError::DimensionMismatch { .. } | VizError::InvalidAlpha(_) | VizError::InvalidStyle(_) => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (code, msg) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::Internal(m) => {
                error!("visualize: {m}");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (code, msg).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/api/defaults",
    tag = "Visualization",
    summary = "Default rendering parameters",
    description = "Returns the alpha, seed and overlay style used for fields a visualize request leaves out.",
    responses(
        (status = 200, description = "Server defaults", body = DefaultsResponse)
    )
)]
async fn get_defaults(State(state): State<AppState>) -> Json<DefaultsResponse> {
    Json(DefaultsResponse { defaults: (*state.defaults).clone() })
}

#[derive(OpenApi)]
#[openapi(
    paths(get_defaults, visualize),
    components(schemas(
        VisualizeRequest,
        VisualizeResponse,
        RegionInput,
        RegionResult,
        DefaultsResponse,
        VisualizationConfig,
        OverlayStyle
    ))
)]
pub struct ApiDoc;

#[utoipa::path(
    post,
    path = "/api/visualize",
    tag = "Visualization",
    summary = "Rank segmentation regions and composite them over the image",
    description = r#"Request body fields:
- image_b64: Base64 PNG/JPEG of the image the masks were computed on.
- regions: Masks (row-major boolean grids matching the image size) with optional area, score, box and label.
- alpha: Optional fill opacity (0..1). Default 0.4.
- seed: Optional color seed for a reproducible palette.
- style: Optional overlay style (outline thickness, labels, boxes).
- request_id: Optional client correlation ID (UUID). Server generates one if omitted.
"#,
    request_body = VisualizeRequest,
    responses(
        (status = 200, description = "Ranked regions and the composited PNG", body = VisualizeResponse),
        (status = 400, description = "Bad image, ragged or mis-sized mask, alpha or style out of range")
    )
)]
async fn visualize(
    State(state): State<AppState>,
    Json(req): Json<VisualizeRequest>,
) -> Result<Json<VisualizeResponse>, AppError> {
    let request_id = req.request_id.unwrap_or_else(Uuid::new_v4);
    info!("visualize: request_id={}, regions={}", request_id, req.regions.len());

    // 1) Decode image
    let img_bytes = B64
        .decode(req.image_b64.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("invalid base64: {e}")))?;
    let image = image::load_from_memory(&img_bytes)
        .map_err(|e| AppError::BadRequest(format!("invalid image: {e}")))?
        .to_rgb8();

    // 2) Build regions
    let regions = req
        .regions
        .into_iter()
        .enumerate()
        .map(|(i, r)| to_raw_region(i, r))
        .collect::<Result<Vec<_>, _>>()?;

    // 3) Merge request overrides onto server defaults
    let config = VisualizationConfig {
        alpha: req.alpha.unwrap_or(state.defaults.alpha),
        seed: req.seed.or(state.defaults.seed),
        style: req.style.unwrap_or_else(|| state.defaults.style.clone()),
    };
    config.validate()?;
    let pipeline = VisualizationPipeline::new(config);

    // 4) Render off the async workers, bounded by the render slots
    let _permit = state
        .render_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let t0 = Instant::now();
    let output = tokio::task::spawn_blocking(move || pipeline.run(&image, regions))
        .await
        .map_err(|e| AppError::Internal(format!("render task failed: {e}")))??;
    let render_ms = t0.elapsed().as_millis();

    Ok(Json(to_response(request_id, output, render_ms)?))
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/defaults", get(get_defaults))
        .route("/visualize", post(visualize));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn to_raw_region(index: usize, input: RegionInput) -> Result<RawRegion, AppError> {
    let height = input.mask.len();
    let width = input.mask.first().map_or(0, Vec::len);
    if let Some(row) = input.mask.iter().position(|r| r.len() != width) {
        return Err(AppError::BadRequest(format!(
            "region {index}: mask row {row} has {} entries, expected {width}",
            input.mask[row].len()
        )));
    }
    let flat: Vec<bool> = input.mask.into_iter().flatten().collect();
    let mask = Mask::from_shape_vec((height, width), flat)
        .map_err(|e| AppError::BadRequest(format!("region {index}: bad mask shape: {e}")))?;

    let mut region = match input.area {
        Some(area) => RawRegion::new(mask, area),
        None => RawRegion::from_mask(mask),
    };
    region.score = input.score;
    region.bbox = input.bbox;
    region.label = input.label;
    Ok(region)
}

fn to_response(request_id: Uuid, output: AnnotatedOutput, render_ms: u128) -> Result<VisualizeResponse, AppError> {
    let (width, height) = output.composite_image.dimensions();
    let visualization_png_b64 = encode_png(output.composite_image)?;
    let regions = output.ranked_regions.into_iter().map(to_region_result).collect();
    Ok(VisualizeResponse { request_id, width, height, regions, visualization_png_b64, render_ms })
}

fn to_region_result(ranked: RankedRegion) -> RegionResult {
    let RankedRegion { region, rank, color, annotation } = ranked;
    RegionResult {
        rank,
        area: region.area,
        score: region.score,
        bbox: region.bbox,
        label: region.label,
        color: color.0,
        centroid: annotation.centroid.map(|(x, y)| [x, y]),
        mask: region.mask.outer_iter().map(|row| row.to_vec()).collect(),
    }
}

fn encode_png(image: RgbImage) -> Result<String, AppError> {
    let mut out_bytes: Vec<u8> = Vec::new();
    {
        let img_dyn = DynamicImage::ImageRgb8(image);
        let mut cursor = std::io::Cursor::new(&mut out_bytes);
        img_dyn
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    Ok(B64.encode(out_bytes))
}
