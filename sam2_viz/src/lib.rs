//! Post-processing for segmentation output: ranks region masks, gives each a
//! color, and composites them with outlines and labels over the source image.

pub mod colors;
pub mod compositor;
pub mod config;
pub mod contour;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod ranker;
pub mod region;
pub mod server;
pub mod shared;

pub use colors::{allocate, ColorAllocator};
pub use compositor::{blend, composite, OverlayStyle};
pub use contour::{annotate, Annotation};
pub use error::VizError;
pub use pipeline::{run, Segmenter, VisualizationConfig, VisualizationPipeline};
pub use ranker::rank;
pub use region::{AnnotatedOutput, BoxXyxy, Mask, RankedRegion, RawRegion};
