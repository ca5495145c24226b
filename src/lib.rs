pub mod assign;
pub mod core;
pub mod detect;
pub mod export;
pub mod pipeline;
pub mod raster;
pub mod retouch;
pub mod trace;

pub use crate::core::config::{DetectionConfig, ThresholdMode};
pub use crate::core::model::{AssignmentResult, HintTable, LabelHint, Manifest, Region};
pub use pipeline::{run_extraction, ExtractionReport, PageSource, PipelineConfig};
