//! Annotated overlay: contours drawn on a copy of the input image.
//!
//! Every presentation contour of the threshold overview is drawn thin in
//! red. The largest ranked particle is then drawn thick in red and the
//! second thick in blue, so the two measured particles stand out.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use rubble_pipeline::{ContourSet, RankedResult, types::Contour};

/// Color of overview contours and the largest particle.
pub const LARGEST_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Color of the second particle.
pub const SECOND_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Half-width of thick outlines, in pixels.
const THICK_OFFSET: i32 = 1;

/// Draw the overview and ranked particles on a copy of `image`.
#[must_use = "returns the annotated copy"]
pub fn annotate(image: &RgbImage, overview: &ContourSet, ranked: &RankedResult) -> RgbImage {
    let mut canvas = image.clone();

    for traced in overview.presentation() {
        draw_outline(&mut canvas, &traced.contour, LARGEST_COLOR, 0);
    }
    if let Some(largest) = ranked.largest() {
        draw_outline(&mut canvas, &largest.contour, LARGEST_COLOR, THICK_OFFSET);
    }
    if let Some(second) = ranked.second() {
        draw_outline(&mut canvas, &second.contour, SECOND_COLOR, THICK_OFFSET);
    }

    canvas
}

/// Draw a closed outline, repeated at every offset in
/// `-offset..=offset` on both axes.
#[allow(clippy::cast_possible_truncation)]
fn draw_outline(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>, offset: i32) {
    let points = contour.points();
    if points.len() < 2 {
        if let Some(p) = points.first() {
            draw_line_segment_mut(canvas, (p.x as f32, p.y as f32), (p.x as f32, p.y as f32), color);
        }
        return;
    }

    for dy in -offset..=offset {
        for dx in -offset..=offset {
            #[allow(clippy::cast_precision_loss)]
            let (ox, oy) = (dx as f32, dy as f32);
            let closing = points.last().into_iter().chain(points.iter());
            for (a, b) in closing.zip(points.iter()) {
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32 + ox, a.y as f32 + oy),
                    (b.x as f32 + ox, b.y as f32 + oy),
                    color,
                );
            }
        }
    }
}
