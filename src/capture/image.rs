//! Captured still image type

use chrono::{DateTime, Local};
use image::RgbaImage;

use super::platform::RawPhoto;
use crate::error::CaptureError;

/// A captured still with its RGBA pixels
#[derive(Clone, Debug)]
pub struct CapturedImage {
    rgba: RgbaImage,
    captured_at: DateTime<Local>,
}

impl CapturedImage {
    pub fn new(rgba: RgbaImage) -> Self {
        Self {
            rgba,
            captured_at: Local::now(),
        }
    }

    /// Materialize the platform's photo data as an image
    pub fn from_raw_photo(photo: RawPhoto) -> Result<Self, CaptureError> {
        let rgba = match photo {
            RawPhoto::Encoded(bytes) => image::load_from_memory(&bytes)
                .map_err(|e| CaptureError::FrameDecodeFailed(e.to_string()))?
                .into_rgba8(),
            RawPhoto::Rgba {
                width,
                height,
                data,
            } => RgbaImage::from_raw(width, height, data).ok_or_else(|| {
                CaptureError::FrameDecodeFailed(format!(
                    "pixel buffer does not match {}x{}",
                    width, height
                ))
            })?,
        };
        log::debug!(
            "CapturedImage materialized: {}x{} pixels",
            rgba.width(),
            rgba.height()
        );
        Ok(Self::new(rgba))
    }

    /// Decode an image the host obtained elsewhere, e.g. from the photo library
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, CaptureError> {
        Self::from_raw_photo(RawPhoto::Encoded(bytes.to_vec()))
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }
}
