pub mod cli;
pub mod error;
pub mod mapping;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod service;

pub use crate::cli::Args;
pub use crate::error::DetectError;
pub use crate::mapping::load_class_names;
pub use crate::model::{OnnxModel, YoloDetector};
pub use crate::pipeline::{Detection, Model, detect_objects};
pub use crate::postprocess::{
    BoundingBox, CONF_THRESHOLD, Candidate, NMS_THRESHOLD, SCORE_THRESHOLD, compute_iou,
    decode_outputs, non_maximum_suppression,
};
pub use crate::preprocess::{PreprocessConfig, Processor};
pub use crate::service::{AppState, decode_image_payload, router, serve};
