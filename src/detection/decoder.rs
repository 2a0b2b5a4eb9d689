//! Scorer output decoding
//!
//! Single pass over the candidates: drop everything under the confidence
//! threshold, keep the strictly best survivor (first seen wins ties) and
//! project its box onto the original image. No sorting and no suppression of
//! overlapping boxes; only one box is ever reported.

use crate::error::DecodeError;

use super::tensor::OutputTensor;
use super::types::{Detection, ValidationResult};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.9;

/// Decode a raw scorer tensor into a verdict for an image of
/// `image_width × image_height` pixels.
pub fn decode(
    output: &OutputTensor,
    image_width: u32,
    image_height: u32,
    confidence_threshold: f32,
) -> Result<ValidationResult, DecodeError> {
    let detections = output.detections()?;
    Ok(decode_detections(
        detections,
        image_width,
        image_height,
        confidence_threshold,
    ))
}

/// Pick the best candidate at or above `confidence_threshold`.
pub fn decode_detections<I>(
    detections: I,
    image_width: u32,
    image_height: u32,
    confidence_threshold: f32,
) -> ValidationResult
where
    I: IntoIterator<Item = Detection>,
{
    let mut best: Option<Detection> = None;
    let mut candidates = 0usize;
    for detection in detections {
        candidates += 1;
        // NaN never passes
        if !detection.confidence.is_finite() || detection.confidence < confidence_threshold {
            continue;
        }
        if best.is_none_or(|b| detection.confidence > b.confidence) {
            best = Some(detection);
        }
    }

    match best {
        Some(winner) => {
            let bounding_box = winner.to_pixel_box(image_width, image_height);
            log::debug!(
                "Best of {} candidates: confidence {:.3} at {:?}",
                candidates,
                winner.confidence,
                bounding_box
            );
            ValidationResult::receipt(winner.confidence, bounding_box)
        }
        None => {
            log::debug!(
                "No candidate of {} reached confidence {}",
                candidates,
                confidence_threshold
            );
            ValidationResult::not_a_receipt()
        }
    }
}
