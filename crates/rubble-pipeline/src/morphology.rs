//! Morphological cleanup of binary masks.
//!
//! Structuring elements are squares of odd side length `s`, expressed to
//! `imageproc` as an L∞ radius of `s / 2`. An even side rounds up to the
//! next odd side, so 4 behaves as 5.

use std::collections::HashSet;

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{Connectivity, connected_components};

/// L∞ radius for a square structuring element of side `side`.
fn radius(side: u32) -> u8 {
    u8::try_from(side / 2).unwrap_or(u8::MAX)
}

/// Morphological closing (dilate then erode) with a `side`×`side` square.
///
/// Bridges gaps narrower than the element. A side of one or less is a
/// no-op.
#[must_use = "returns the closed mask"]
pub fn close(mask: &GrayImage, side: u32) -> GrayImage {
    match radius(side) {
        0 => mask.clone(),
        k => imageproc::morphology::close(mask, Norm::LInf, k),
    }
}

/// Morphological opening (erode then dilate) with a `side`×`side` square.
///
/// Removes foreground features thinner than the element. A side of one
/// or less is a no-op.
#[must_use = "returns the opened mask"]
pub fn open(mask: &GrayImage, side: u32) -> GrayImage {
    match radius(side) {
        0 => mask.clone(),
        k => imageproc::morphology::open(mask, Norm::LInf, k),
    }
}

/// Fill background regions completely enclosed by foreground.
///
/// Background is labelled with 4-connectivity so a diagonal step in an
/// 8-connected outline still seals the region it surrounds. Every
/// background component that does not touch the image border becomes
/// foreground.
#[must_use = "returns the filled mask"]
pub fn fill_holes(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return mask.clone();
    }

    let background = GrayImage::from_fn(w, h, |x, y| {
        if mask.get_pixel(x, y).0[0] > 0 {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    });
    let labels = connected_components(&background, Connectivity::Four, image::Luma([0u8]));

    let mut exterior: HashSet<u32> = HashSet::new();
    for x in 0..w {
        exterior.insert(labels.get_pixel(x, 0).0[0]);
        exterior.insert(labels.get_pixel(x, h - 1).0[0]);
    }
    for y in 0..h {
        exterior.insert(labels.get_pixel(0, y).0[0]);
        exterior.insert(labels.get_pixel(w - 1, y).0[0]);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let label = labels.get_pixel(x, y).0[0];
        if label == 0 || !exterior.contains(&label) {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}
