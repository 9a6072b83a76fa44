//! Shape descriptors for a single particle outline.
//!
//! Every ratio is guarded: a zero denominator yields 0 rather than a
//! non-finite value, so descriptors of degenerate contours serialize
//! cleanly.

use geo::{Area, ConvexHull, Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Contour, Point};

/// A circle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    /// Center.
    pub center: Point,
    /// Radius in pixels.
    pub radius: f64,
}

impl Circle {
    /// Tolerance for containment tests, absorbing rounding in the
    /// circumcircle computation.
    const EPSILON: f64 = 1e-7;

    fn contains(&self, p: Point) -> bool {
        self.center.distance(p) <= self.radius + Self::EPSILON
    }

    fn from_diameter(a: Point, b: Point) -> Self {
        Self {
            center: Point::new(f64::midpoint(a.x, b.x), f64::midpoint(a.y, b.y)),
            radius: a.distance(b) / 2.0,
        }
    }

    /// Circle through three points, or the widest two-point circle when
    /// they are colinear.
    fn through(a: Point, b: Point, c: Point) -> Self {
        let bx = b.x - a.x;
        let by = b.y - a.y;
        let cx = c.x - a.x;
        let cy = c.y - a.y;
        let d = 2.0 * bx.mul_add(cy, -(by * cx));
        if d.abs() < f64::EPSILON {
            return [
                Self::from_diameter(a, b),
                Self::from_diameter(a, c),
                Self::from_diameter(b, c),
            ]
            .into_iter()
            .max_by(|l, r| l.radius.total_cmp(&r.radius))
            .unwrap_or_default();
        }
        let b2 = bx.mul_add(bx, by * by);
        let c2 = cx.mul_add(cx, cy * cy);
        let ux = cy.mul_add(b2, -(by * c2)) / d;
        let uy = bx.mul_add(c2, -(cx * b2)) / d;
        let center = Point::new(a.x + ux, a.y + uy);
        Self {
            center,
            radius: center.distance(a),
        }
    }
}

/// Smallest circle containing every point (incremental Welzl).
///
/// Returns a zero circle at the origin for an empty input.
#[must_use]
pub fn min_enclosing_circle(points: &[Point]) -> Circle {
    let Some(&first) = points.first() else {
        return Circle::default();
    };
    let mut circle = Circle {
        center: first,
        radius: 0.0,
    };
    for i in 1..points.len() {
        if circle.contains(points[i]) {
            continue;
        }
        circle = Circle {
            center: points[i],
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(points[j]) {
                continue;
            }
            circle = Circle::from_diameter(points[i], points[j]);
            for k in 0..j {
                if !circle.contains(points[k]) {
                    circle = Circle::through(points[i], points[j], points[k]);
                }
            }
        }
    }
    circle
}

/// Area-weighted centroid from first-order polygon moments.
///
/// Zero-area contours report the origin.
#[must_use]
pub fn centroid(contour: &Contour) -> Point {
    let points = contour.points();
    let signed = contour.signed_area();
    if signed.abs() < f64::EPSILON {
        return Point::default();
    }
    let n = points.len();
    let (mut sx, mut sy) = (0.0, 0.0);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.x.mul_add(b.y, -(b.x * a.y));
        sx += (a.x + b.x) * cross;
        sy += (a.y + b.y) * cross;
    }
    Point::new(sx / (6.0 * signed), sy / (6.0 * signed))
}

/// Area of the convex hull of the contour's points.
#[must_use]
pub fn convex_hull_area(contour: &Contour) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let ring: LineString<f64> = contour
        .points()
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(ring, vec![]).convex_hull().unsigned_area()
}

/// `numerator / denominator`, or 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// Geometric description of one contour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeDescriptors {
    /// Enclosed area in square pixels.
    pub area: f64,
    /// Closed perimeter in pixels.
    pub perimeter: f64,
    /// Area-weighted centroid.
    pub centroid: Point,
    /// Axis-aligned bounding box.
    pub bounding_box: BoundingBox,
    /// Smallest enclosing circle.
    pub enclosing_circle: Circle,
    /// Area of the convex hull.
    pub hull_area: f64,
    /// `area / hull_area`.
    pub solidity: f64,
    /// Bounding box `width / height`.
    pub aspect_ratio: f64,
    /// `area / (width * height)` of the bounding box.
    pub extent: f64,
    /// Diameter of the circle with the same area.
    pub equivalent_diameter: f64,
}

impl ShapeDescriptors {
    /// Measure a contour.
    #[must_use]
    pub fn of(contour: &Contour) -> Self {
        let area = contour.area();
        let bounding_box = contour.bounding_box().unwrap_or_default();
        let hull_area = convex_hull_area(contour);
        Self {
            area,
            perimeter: contour.perimeter(),
            centroid: centroid(contour),
            bounding_box,
            enclosing_circle: min_enclosing_circle(contour.points()),
            hull_area,
            solidity: ratio(area, hull_area),
            aspect_ratio: ratio(bounding_box.width, bounding_box.height),
            extent: ratio(area, bounding_box.width * bounding_box.height),
            equivalent_diameter: (4.0 * area / std::f64::consts::PI).sqrt(),
        }
    }
}
