//! Image to scorer input conversion

use image::RgbaImage;
use image::imageops::FilterType;
use std::borrow::Cow;

use super::tensor::InputTensor;
use crate::error::DecodeError;

/// Square input edge expected by the receipt model
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Stretch `image` to `input_size × input_size` and lay it out as planar RGB
/// in `[0, 1]`. Aspect ratio is not preserved; alpha is dropped.
pub fn preprocess(image: &RgbaImage, input_size: u32) -> Result<InputTensor, DecodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::InvalidImageFormat(format!(
            "empty {}x{} image",
            image.width(),
            image.height()
        )));
    }
    if input_size == 0 {
        return Err(DecodeError::InvalidImageFormat(
            "scorer input size must be positive".to_string(),
        ));
    }

    let resized = if image.width() == input_size && image.height() == input_size {
        Cow::Borrowed(image)
    } else {
        log::debug!(
            "Resizing {}x{} image to {}x{} scorer input",
            image.width(),
            image.height(),
            input_size,
            input_size
        );
        Cow::Owned(image::imageops::resize(
            image,
            input_size,
            input_size,
            FilterType::Triangle,
        ))
    };

    let plane = input_size as usize * input_size as usize;
    let mut data = vec![0.0f32; plane * 3];
    for (i, pixel) in resized.pixels().enumerate() {
        let [r, g, b, _] = pixel.0;
        data[i] = r as f32 / 255.0;
        data[plane + i] = g as f32 / 255.0;
        data[2 * plane + i] = b as f32 / 255.0;
    }

    Ok(InputTensor {
        data,
        width: input_size,
        height: input_size,
    })
}
