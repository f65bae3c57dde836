use image::DynamicImage;
use ndarray::{ArrayD, ArrayViewD};
use serde::Serialize;

use crate::error::DetectError;
use crate::postprocess::{
    BoundingBox, CONF_THRESHOLD, NMS_THRESHOLD, SCORE_THRESHOLD, decode_outputs,
    non_maximum_suppression,
};
use crate::preprocess::Processor;

/// The inference seam the pipeline runs against. The production
/// implementation wraps an ONNX Runtime session; tests substitute a
/// canned-output fake.
pub trait Model: Send {
    /// Runs one forward pass on the blob and returns one raw output tensor
    /// per output layer, in the model's layer order. Must be deterministic
    /// for identical input.
    fn forward(&self, blob: ArrayViewD<'_, f32>) -> Result<Vec<ArrayD<f32>>, DetectError>;

    /// Class-name list indexed by detector class id.
    fn class_names(&self) -> &[String];
}

/// One surviving detection, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Runs the whole pipeline on one image: preprocess, forward pass, raw
/// decode with the 0.5 confidence gate, then greedy NMS. Survivors are
/// promoted to labeled records with the confidence rounded to 2 decimals;
/// rounding happens here and nowhere earlier. The returned list is freshly
/// allocated per call.
pub fn detect_objects<M: Model + ?Sized>(
    image: &DynamicImage,
    model: &M,
    processor: &Processor,
) -> Result<Vec<Detection>, DetectError> {
    let blob = processor.blob_from_image(image)?;
    let outs = model.forward(blob.view().into_dyn())?;

    let candidates = decode_outputs(&outs, image.width(), image.height(), CONF_THRESHOLD)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let keep = non_maximum_suppression(&candidates, SCORE_THRESHOLD, NMS_THRESHOLD);
    keep.into_iter()
        .map(|i| {
            let candidate = &candidates[i];
            let label = model
                .class_names()
                .get(candidate.class_id)
                .cloned()
                .ok_or(DetectError::UnknownClass(candidate.class_id))?;
            Ok(Detection {
                label,
                confidence: (candidate.confidence * 100.0).round() / 100.0,
                bbox: candidate.bbox,
            })
        })
        .collect()
}
