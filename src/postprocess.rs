use std::cmp::Reverse;

use ndarray::{ArrayD, ArrayView1, ArrayView2, Axis, Ix2, Ix3};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::DetectError;

/// Per-class confidence gate applied while scanning raw output rows.
pub const CONF_THRESHOLD: f32 = 0.5;
/// Minimum confidence for a candidate to enter suppression. Subsumed by the
/// stricter decode gate above; kept as its own knob (see DESIGN.md).
pub const SCORE_THRESHOLD: f32 = 0.3;
/// IoU at or above which an overlapping candidate is suppressed.
pub const NMS_THRESHOLD: f32 = 0.4;

/// Number of geometry values leading every output row; the per-class scores
/// follow immediately after.
const BOX_ATTRS: usize = 4;

/// Pixel-space box, top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One above-threshold raw prediction, possibly overlapping others.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

fn argmax_and_max(scores: &ArrayView1<f32>) -> (usize, f32) {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, &val)| {
            if val > max_val { (i, val) } else { (max_idx, max_val) }
        })
}

/// Views an output tensor as a 2-D row table, stripping a leading
/// singleton batch axis if the exporter kept one.
fn as_rows(out: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>, DetectError> {
    match out.ndim() {
        2 => Ok(out.view().into_dimensionality::<Ix2>()?),
        3 => Ok(out
            .view()
            .into_dimensionality::<Ix3>()?
            .index_axis_move(Axis(0), 0)),
        rank => Err(DetectError::OutputRank(rank)),
    }
}

/// Scans every row of every output tensor and keeps the ones whose best
/// class score exceeds `conf_threshold`.
///
/// Rows are laid out `[center_x, center_y, width, height, score_1..score_K]`
/// with spatial values normalized to [0, 1]. Geometry is denormalized by the
/// *original* image size (not the blob size) and truncated toward zero, then
/// the center is shifted to the top-left corner. Boxes are not clipped to
/// the image bounds; rows decoding to a negative width or height are
/// rejected.
pub fn decode_outputs(
    outs: &[ArrayD<f32>],
    img_width: u32,
    img_height: u32,
    conf_threshold: f32,
) -> Result<Vec<Candidate>, DetectError> {
    let mut candidates = Vec::new();

    for out in outs {
        let rows = as_rows(out)?;
        for detection in rows.axis_iter(Axis(0)) {
            if detection.len() < BOX_ATTRS + 1 {
                return Err(DetectError::RowLayout {
                    expected: BOX_ATTRS + 1,
                    actual: detection.len(),
                });
            }

            let scores = detection.slice(ndarray::s![BOX_ATTRS..]);
            let (class_id, confidence) = argmax_and_max(&scores);
            if confidence <= conf_threshold {
                continue;
            }

            let center_x = (detection[0] * img_width as f32) as i32;
            let center_y = (detection[1] * img_height as f32) as i32;
            let w = (detection[2] * img_width as f32) as i32;
            let h = (detection[3] * img_height as f32) as i32;
            if w < 0 || h < 0 {
                continue;
            }
            let x = (center_x as f32 - w as f32 / 2.0) as i32;
            let y = (center_y as f32 - h as f32 / 2.0) as i32;

            candidates.push(Candidate {
                class_id,
                confidence,
                bbox: BoundingBox {
                    x,
                    y,
                    width: w,
                    height: h,
                },
            });
        }
    }

    Ok(candidates)
}

/// Intersection over union of two corner-format pixel boxes. Returns 0.0
/// when the union is empty.
pub fn compute_iou(b1: &BoundingBox, b2: &BoundingBox) -> f32 {
    let (x1_1, y1_1) = (b1.x as f32, b1.y as f32);
    let (x2_1, y2_1) = ((b1.x + b1.width) as f32, (b1.y + b1.height) as f32);
    let (x1_2, y1_2) = (b2.x as f32, b2.y as f32);
    let (x2_2, y2_2) = ((b2.x + b2.width) as f32, (b2.y + b2.height) as f32);

    let inter_x1 = x1_1.max(x1_2);
    let inter_y1 = y1_1.max(y1_2);
    let inter_x2 = x2_1.min(x2_2);
    let inter_y2 = y2_1.min(y2_2);

    let inter_area = (inter_x2 - inter_x1).max(0.0) * (inter_y2 - inter_y1).max(0.0);
    let area1 = (x2_1 - x1_1).max(0.0) * (y2_1 - y1_1).max(0.0);
    let area2 = (x2_2 - x1_2).max(0.0) * (y2_2 - y1_2).max(0.0);
    let union_area = area1 + area2 - inter_area;
    if union_area <= 0.0 {
        0.0
    } else {
        inter_area / union_area
    }
}

/// Greedy non-maximum suppression over all candidates at once.
///
/// Candidates below `score_threshold` are dropped up front; the rest are
/// walked in descending confidence order, and everything overlapping an
/// already-kept box with IoU >= `nms_threshold` is suppressed. Class
/// identity is deliberately ignored, so boxes of different classes suppress
/// each other. Returns the kept indices in emission order.
pub fn non_maximum_suppression(
    candidates: &[Candidate],
    score_threshold: f32,
    nms_threshold: f32,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].confidence >= score_threshold)
        .collect();
    order.sort_by_key(|&i| Reverse(OrderedFloat(candidates[i].confidence)));

    let mut keep_indices = Vec::new();
    let mut suppressed = vec![false; order.len()];
    for i in 0..order.len() {
        if suppressed[i] {
            continue;
        }
        let idx_i = order[i];
        keep_indices.push(idx_i);
        for j in (i + 1)..order.len() {
            if suppressed[j] {
                continue;
            }
            let iou = compute_iou(&candidates[idx_i].bbox, &candidates[order[j]].bbox);
            if iou >= nms_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep_indices
}
