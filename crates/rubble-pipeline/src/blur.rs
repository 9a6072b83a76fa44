//! Gaussian blur for noise reduction before edge detection.
//!
//! The blur is configured by an odd square kernel size, the way most
//! vision toolkits expose it, and converted to a sigma for
//! [`imageproc::filter::gaussian_blur_f32`].

use image::GrayImage;

/// Coerce a kernel size to the odd value actually used.
///
/// Even sizes round up to the next odd size (`4 -> 5`) and zero becomes
/// one, which means no blur.
#[must_use]
pub const fn effective_kernel(kernel: u32) -> u32 {
    if kernel == 0 {
        1
    } else if kernel % 2 == 0 {
        kernel.saturating_add(1)
    } else {
        kernel
    }
}

/// Sigma derived from an odd kernel size: `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
///
/// Returns `0.0` for a kernel of one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    let k = effective_kernel(kernel);
    if k <= 1 {
        return 0.0;
    }
    let half_width = (k - 1) as f32 * 0.5;
    0.3f32.mul_add(half_width - 1.0, 0.8)
}

/// Apply Gaussian blur with the given kernel size.
///
/// A kernel of one (after [`effective_kernel`] coercion) returns the
/// image unchanged, since `imageproc`'s underlying function panics on
/// `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, kernel: u32) -> GrayImage {
    let sigma = sigma_for_kernel(kernel);
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bright stone of radius 10 on dark ground, plus one hot pixel.
    fn stone_with_speck() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            let (dx, dy) = (f64::from(x) - 15.0, f64::from(y) - 20.0);
            if (x, y) == (35, 5) || dx.hypot(dy) <= 10.0 {
                image::Luma([230])
            } else {
                image::Luma([30])
            }
        })
    }

    #[test]
    fn even_kernels_round_up() {
        assert_eq!(effective_kernel(0), 1);
        assert_eq!(effective_kernel(1), 1);
        assert_eq!(effective_kernel(4), 5);
        assert_eq!(effective_kernel(5), 5);
        assert_eq!(effective_kernel(u32::MAX), u32::MAX);
    }

    #[test]
    fn sigma_matches_kernel_rule() {
        assert!(sigma_for_kernel(1).abs() < f32::EPSILON);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(4) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn kernel_of_one_is_identity() {
        let img = stone_with_speck();
        assert_eq!(gaussian_blur(&img, 1), img);
        assert_eq!(gaussian_blur(&img, 0), img);
    }

    #[test]
    fn isolated_speck_is_suppressed() {
        let blurred = gaussian_blur(&stone_with_speck(), 5);
        assert_eq!(blurred.dimensions(), (40, 40));
        let speck = blurred.get_pixel(35, 5).0[0];
        assert!(speck < 127, "speck should fall below mid-gray, got {speck}");
    }

    #[test]
    fn stone_interior_survives() {
        let blurred = gaussian_blur(&stone_with_speck(), 5);
        let center = blurred.get_pixel(15, 20).0[0];
        let rim = blurred.get_pixel(25, 20).0[0];
        assert!(center > 220, "stone center washed out: {center}");
        assert!(rim > 30 && rim < 230, "rim should be softened, got {rim}");
    }
}
