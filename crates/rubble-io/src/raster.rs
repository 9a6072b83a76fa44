//! Raster image loading and saving.

use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::StoreError;

/// Read and decode an image file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read, and
/// [`StoreError::Pipeline`] if the bytes are empty, undecodable, or the
/// image is smaller than [`rubble_pipeline::MIN_IMAGE_SIDE`] on either side.
pub fn load_image(path: &Path) -> Result<DynamicImage, StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = rubble_pipeline::decode_image(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded image",
    );
    Ok(image)
}

/// Save an RGB image, choosing the format from the file extension.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the parent directory cannot be created,
/// and [`StoreError::Image`] if encoding or writing fails.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgb;
    use rubble_pipeline::PipelineError;

    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.png");
        let img = RgbImage::from_pixel(64, 64, Rgb([12, 34, 56]));
        save_image(&img, &path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.to_rgb8(), img);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_image(&dir.path().join("absent.png"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn undersized_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        save_image(&RgbImage::new(30, 80), &path).unwrap();
        let result = load_image(&path);
        assert!(matches!(
            result,
            Err(StoreError::Pipeline(PipelineError::ImageTooSmall { .. }))
        ));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(StoreError::Pipeline(PipelineError::ImageDecode(_)))
        ));
    }
}
