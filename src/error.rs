use thiserror::Error;

/// Everything that can go wrong between receiving image bytes and
/// producing the final detection list.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("failed to resize image: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("unexpected output tensor shape: {0}")]
    OutputShape(#[from] ndarray::ShapeError),

    #[error("output tensor has rank {0}, expected a 2-D row table (optionally batched)")]
    OutputRank(usize),

    #[error("output row carries {actual} values, expected at least {expected}")]
    RowLayout { expected: usize, actual: usize },

    #[error("class id {0} has no entry in the class-name list")]
    UnknownClass(usize),
}
