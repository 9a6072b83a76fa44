//! Contour extraction: closed particle outlines from a binary mask.
//!
//! Border following is delegated to
//! [`imageproc::contours::find_contours`] (Suzuki-Abe), which reports
//! every outer and hole border together with its parent. Straight runs
//! of boundary pixels are compressed to their end points; area and
//! perimeter are unchanged by the compression.

use image::GrayImage;
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Dimensions, Point};

/// Which borders to keep from a border-following pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalMode {
    /// Only the outermost boundary of each connected component.
    #[default]
    ExternalOnly,
    /// Every boundary, including holes, with parent links.
    FullHierarchy,
}

/// Whether a border separates a component from the background outside
/// it or from a hole inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    /// Outer boundary of a foreground component.
    Outer,
    /// Boundary of a background hole inside a component.
    Hole,
}

/// One traced border with its hierarchy information.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedContour {
    /// The compressed outline.
    pub contour: Contour,
    /// Outer or hole border.
    pub border: BorderKind,
    /// Index of the enclosing border in the same [`ContourSet`], if any.
    pub parent: Option<usize>,
}

/// All contours from one extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourSet {
    contours: Vec<TracedContour>,
    dimensions: Dimensions,
}

impl ContourSet {
    /// Every traced contour in discovery order.
    #[must_use]
    pub fn contours(&self) -> &[TracedContour] {
        &self.contours
    }

    /// Dimensions of the mask the contours were traced from.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of contours.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Returns `true` if no contours were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Returns `true` if `traced` is an outer border spanning the whole
    /// image, as produced when the foreground touches all four edges.
    #[must_use]
    pub fn is_frame(&self, traced: &TracedContour) -> bool {
        if traced.border != BorderKind::Outer {
            return false;
        }
        traced.contour.bounding_box().is_some_and(|b| {
            b.x <= 0.0
                && b.y <= 0.0
                && b.width >= f64::from(self.dimensions.width)
                && b.height >= f64::from(self.dimensions.height)
        })
    }

    /// Contours suitable for drawing: everything except the image frame.
    pub fn presentation(&self) -> impl Iterator<Item = &TracedContour> + '_ {
        self.contours.iter().filter(|c| !self.is_frame(c))
    }

    /// Consume the set, returning bare outlines in discovery order.
    #[must_use]
    pub fn into_contours(self) -> Vec<Contour> {
        self.contours.into_iter().map(|c| c.contour).collect()
    }
}

/// Trace contours in a binary mask (non-zero pixels are foreground).
///
/// An all-zero mask yields an empty set. With
/// [`RetrievalMode::ExternalOnly`] parent links are cleared, since the
/// borders they would point at are not retained.
#[must_use = "returns the traced contours"]
pub fn find_contours(mask: &GrayImage, mode: RetrievalMode) -> ContourSet {
    let dimensions = Dimensions {
        width: mask.width(),
        height: mask.height(),
    };
    let raw: Vec<imageproc::contours::Contour<i32>> = imageproc::contours::find_contours(mask);

    let contours = raw
        .into_iter()
        .filter_map(|c| {
            let border = match c.border_type {
                BorderType::Outer => BorderKind::Outer,
                BorderType::Hole => BorderKind::Hole,
            };
            let parent = match mode {
                RetrievalMode::FullHierarchy => c.parent,
                RetrievalMode::ExternalOnly => {
                    if border != BorderKind::Outer || c.parent.is_some() {
                        return None;
                    }
                    None
                }
            };
            let points: Vec<(i32, i32)> = c.points.iter().map(|p| (p.x, p.y)).collect();
            Some(TracedContour {
                contour: compress(&points),
                border,
                parent,
            })
        })
        .collect();

    ContourSet {
        contours,
        dimensions,
    }
}

/// Drop points in the middle of straight runs, keeping direction changes.
fn compress(points: &[(i32, i32)]) -> Contour {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let n = points.len();
    let to_point = |(x, y): (i32, i32)| Point::new(f64::from(x), f64::from(y));
    if n <= 2 {
        return Contour::new(points.iter().copied().map(to_point).collect());
    }

    let kept = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.0 - prev.0, cur.1 - prev.1) != (next.0 - cur.0, next.1 - cur.1)
        })
        .map(|i| to_point(points[i]))
        .collect();
    Contour::new(kept)
}
