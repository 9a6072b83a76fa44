//! Merging contour populations from two detectors.
//!
//! Two contours describe the same particle when their areas agree within
//! a relative tolerance and their centroids are close. Comparison runs
//! over immutable `{id, area, centroid}` snapshots; the surviving ids
//! then move their contours out of an id-indexed arena, so no contour is
//! cloned or compared by identity.

use serde::{Deserialize, Serialize};

use crate::shape::centroid;
use crate::types::{Contour, PipelineError, Point};

/// When two contours count as the same particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityCriteria {
    /// Maximum area difference as a fraction of the larger area.
    pub area_tolerance: f64,
    /// Centroid distance (pixels) below which contours may match.
    pub max_centroid_distance: f64,
}

impl SimilarityCriteria {
    /// Check that both limits are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for negative or
    /// non-finite limits.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, value) in [
            ("area_tolerance", self.area_tolerance),
            ("max_centroid_distance", self.max_centroid_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "similarity {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimilarityCriteria {
    fn default() -> Self {
        Self {
            area_tolerance: 0.1,
            max_centroid_distance: 20.0,
        }
    }
}

/// Value snapshot of a contour used for similarity tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Index of the contour in the merge arena.
    pub id: usize,
    /// Enclosed area.
    pub area: f64,
    /// Area-weighted centroid.
    pub centroid: Point,
}

impl Snapshot {
    /// Snapshot a contour under the given arena id.
    #[must_use]
    pub fn of(id: usize, contour: &Contour) -> Self {
        Self {
            id,
            area: contour.area(),
            centroid: centroid(contour),
        }
    }
}

/// Returns `true` if `a` and `b` describe the same particle.
///
/// Zero-area contours have no meaningful centroid and never match.
#[must_use]
pub fn is_same_particle(a: &Snapshot, b: &Snapshot, criteria: &SimilarityCriteria) -> bool {
    if a.area <= 0.0 || b.area <= 0.0 {
        return false;
    }
    let larger = a.area.max(b.area);
    (a.area - b.area).abs() <= criteria.area_tolerance * larger
        && a.centroid.distance(b.centroid) < criteria.max_centroid_distance
}

/// Concatenate `primary` and `secondary` and drop later contours that
/// duplicate an earlier kept one.
///
/// Order is preserved: primary contours first, then the secondary
/// contours that were not matched.
#[must_use]
pub fn merge_contours(
    primary: Vec<Contour>,
    secondary: Vec<Contour>,
    criteria: &SimilarityCriteria,
) -> Vec<Contour> {
    let mut arena: Vec<Option<Contour>> = primary.into_iter().chain(secondary).map(Some).collect();
    let snapshots: Vec<Snapshot> = arena
        .iter()
        .enumerate()
        .filter_map(|(id, c)| c.as_ref().map(|c| Snapshot::of(id, c)))
        .collect();

    let mut kept: Vec<Snapshot> = Vec::with_capacity(snapshots.len());
    for candidate in snapshots {
        if !kept
            .iter()
            .any(|k| is_same_particle(k, &candidate, criteria))
        {
            kept.push(candidate);
        }
    }

    kept.iter()
        .filter_map(|s| arena.get_mut(s.id).and_then(Option::take))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis-aligned rectangle with its top-left corner at `(x, y)`.
    fn rect(x: f64, y: f64, w: f64, h: f64) -> Contour {
        Contour::new(vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ])
    }

    #[test]
    fn near_identical_contours_merge() {
        // Areas 100 and 105, centroids 5 px apart.
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(4.75, 0.0, 10.5, 10.0);
        let sa = Snapshot::of(0, &a);
        let sb = Snapshot::of(1, &b);
        assert!((sa.area - 100.0).abs() < 1e-9);
        assert!((sb.area - 105.0).abs() < 1e-9);
        assert!((sa.centroid.distance(sb.centroid) - 5.0).abs() < 1e-9);
        assert!(is_same_particle(&sa, &sb, &SimilarityCriteria::default()));

        let merged = merge_contours(vec![a.clone()], vec![b], &SimilarityCriteria::default());
        assert_eq!(merged, vec![a]);
    }

    #[test]
    fn different_sizes_never_merge() {
        // Areas 100 and 200 with the same centroid.
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(-5.0, 0.0, 20.0, 10.0);
        let sa = Snapshot::of(0, &a);
        let sb = Snapshot::of(1, &b);
        assert!(!is_same_particle(&sa, &sb, &SimilarityCriteria::default()));

        let merged = merge_contours(vec![a], vec![b], &SimilarityCriteria::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn distant_centroids_never_merge() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(100.0, 0.0, 10.0, 10.0);
        let merged = merge_contours(vec![a], vec![b], &SimilarityCriteria::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn zero_area_is_never_similar() {
        let line = Contour::new(vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
        let s = Snapshot::of(0, &line);
        assert!(!is_same_particle(&s, &s, &SimilarityCriteria::default()));
    }

    #[test]
    fn primary_order_is_kept_before_secondary() {
        let p = vec![rect(0.0, 0.0, 10.0, 10.0)];
        let s = vec![rect(200.0, 0.0, 8.0, 8.0), rect(1.0, 0.0, 10.0, 10.0)];
        let merged = merge_contours(p, s, &SimilarityCriteria::default());
        assert_eq!(merged.len(), 2);
        assert!(merged[0].points()[0].x.abs() < f64::EPSILON);
        assert!((merged[1].points()[0].x - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_negative_limits() {
        let c = SimilarityCriteria {
            area_tolerance: -0.1,
            ..SimilarityCriteria::default()
        };
        assert!(matches!(c.validate(), Err(PipelineError::InvalidConfig(_))));
    }
}
