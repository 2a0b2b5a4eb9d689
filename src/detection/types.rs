//! Detection result types

use serde::{Deserialize, Serialize};

/// One scorer candidate in model-normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl Detection {
    /// Project the normalized box onto an image of the given pixel size
    pub fn to_pixel_box(&self, image_width: u32, image_height: u32) -> BoundingBox {
        let (w, h) = (image_width as f32, image_height as f32);
        BoundingBox {
            x: (self.center_x - self.width / 2.0) * w,
            y: (self.center_y - self.height / 2.0) * h,
            width: self.width * w,
            height: self.height * h,
        }
    }
}

/// Axis-aligned rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// The same box as fractions of the image size
    pub fn normalized(&self, image_width: u32, image_height: u32) -> BoundingBox {
        let (w, h) = (image_width.max(1) as f32, image_height.max(1) as f32);
        BoundingBox {
            x: self.x / w,
            y: self.y / h,
            width: self.width / w,
            height: self.height / h,
        }
    }
}

/// Verdict for one image
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_receipt: bool,
    pub confidence: f32,
    /// Present exactly when `is_receipt` is true
    pub bounding_box: Option<BoundingBox>,
}

impl ValidationResult {
    pub fn not_a_receipt() -> Self {
        Self {
            is_receipt: false,
            confidence: 0.0,
            bounding_box: None,
        }
    }

    pub fn receipt(confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            is_receipt: true,
            confidence,
            bounding_box: Some(bounding_box),
        }
    }
}
