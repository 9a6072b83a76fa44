//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! [`DynamicImage`] the analysis works from, rejecting inputs too small
//! to hold meaningful particles.

use image::{DynamicImage, GrayImage};

use crate::types::PipelineError;

/// Minimum accepted width and height in pixels.
pub const MIN_IMAGE_SIDE: u32 = 50;

/// Decode raw image bytes.
///
/// Supports whatever the `image` crate can decode with the enabled
/// format features.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::ImageTooSmall`] if either side is below
/// [`MIN_IMAGE_SIDE`].
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    check_size(&img)?;
    Ok(img)
}

/// Reject images smaller than [`MIN_IMAGE_SIDE`] on either side.
///
/// # Errors
///
/// Returns [`PipelineError::ImageTooSmall`] for undersized images.
pub fn check_size(image: &DynamicImage) -> Result<(), PipelineError> {
    if image.width() < MIN_IMAGE_SIDE || image.height() < MIN_IMAGE_SIDE {
        return Err(PipelineError::ImageTooSmall {
            width: image.width(),
            height: image.height(),
            min: MIN_IMAGE_SIDE,
        });
    }
    Ok(())
}

/// Convert to single-channel grayscale.
///
/// Grayscale input passes through unchanged. Color input is reduced with
/// the `image` crate's Rec. 709 luma weights.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}
