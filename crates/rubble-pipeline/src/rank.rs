//! Area filtering and ranking of contours.
//!
//! Contours at or below the minimum area are discarded, the rest are
//! sorted by area (largest first, ties in discovery order), and the
//! largest and "second" particle are picked out.

use serde::{Deserialize, Serialize};

use crate::types::Contour;

/// Rule for choosing which ranked contour counts as the "second" particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondRank {
    /// Rank 1 when fewer than five contours remain, otherwise rank 4.
    ///
    /// Skips the satellite fragments that typically hug the largest
    /// particle in real photographs.
    #[default]
    SkipSatellites,
    /// Always rank 1.
    Adjacent,
}

impl SecondRank {
    /// Number of ranked contours at which [`Self::SkipSatellites`]
    /// switches from rank 1 to rank 4.
    pub const SATELLITE_THRESHOLD: usize = 5;

    /// Index of the second contour in a ranked list of `count`, or
    /// `None` if there are fewer than two.
    #[must_use]
    pub const fn index(self, count: usize) -> Option<usize> {
        match self {
            _ if count < 2 => None,
            Self::SkipSatellites if count >= Self::SATELLITE_THRESHOLD => Some(4),
            Self::SkipSatellites | Self::Adjacent => Some(1),
        }
    }
}

/// A contour together with its measured area and perimeter.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedContour {
    /// The outline.
    pub contour: Contour,
    /// Enclosed area in square pixels.
    pub area: f64,
    /// Closed perimeter in pixels.
    pub perimeter: f64,
}

impl RankedContour {
    /// Measure a contour.
    #[must_use]
    pub fn measure(contour: Contour) -> Self {
        let area = contour.area();
        let perimeter = contour.perimeter();
        Self {
            contour,
            area,
            perimeter,
        }
    }
}

/// Export row for one ranked contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourRecord {
    /// 1-based position in the ranking (1 = largest).
    pub id: usize,
    /// Area in square pixels.
    pub area: f64,
    /// Perimeter in pixels.
    pub perimeter: f64,
}

/// Contours that survived filtering, largest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedResult {
    contours: Vec<RankedContour>,
    total_area: f64,
    second_index: Option<usize>,
}

impl RankedResult {
    /// Ranked contours, largest first.
    #[must_use]
    pub fn contours(&self) -> &[RankedContour] {
        &self.contours
    }

    /// Number of retained contours.
    #[must_use]
    pub fn count(&self) -> usize {
        self.contours.len()
    }

    /// Returns `true` if nothing survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Sum of the retained areas.
    #[must_use]
    pub const fn total_area(&self) -> f64 {
        self.total_area
    }

    /// The largest contour.
    #[must_use]
    pub fn largest(&self) -> Option<&RankedContour> {
        self.contours.first()
    }

    /// Rank index of the second contour.
    #[must_use]
    pub const fn second_index(&self) -> Option<usize> {
        self.second_index
    }

    /// The second contour, chosen by the [`SecondRank`] rule.
    #[must_use]
    pub fn second(&self) -> Option<&RankedContour> {
        self.second_index.and_then(|i| self.contours.get(i))
    }

    /// Largest area as a percentage of the total, 0 when the total is 0.
    #[must_use]
    pub fn area_ratio(&self) -> f64 {
        match self.largest() {
            Some(largest) if self.total_area > 0.0 => largest.area / self.total_area * 100.0,
            _ => 0.0,
        }
    }

    /// Retained areas, largest first.
    #[must_use]
    pub fn areas(&self) -> Vec<f64> {
        self.contours.iter().map(|c| c.area).collect()
    }

    /// Per-contour export rows with 1-based ids in ranked order.
    #[must_use]
    pub fn records(&self) -> Vec<ContourRecord> {
        self.contours
            .iter()
            .enumerate()
            .map(|(i, c)| ContourRecord {
                id: i + 1,
                area: c.area,
                perimeter: c.perimeter,
            })
            .collect()
    }
}

/// Keep only contours whose area is strictly greater than `min_area`.
#[must_use]
pub fn filter_by_area(contours: Vec<Contour>, min_area: f64) -> Vec<Contour> {
    contours.into_iter().filter(|c| c.area() > min_area).collect()
}

/// Filter by area, sort descending by area, and select the largest and
/// second contour.
#[must_use = "returns the ranked contours"]
pub fn filter_and_rank(contours: Vec<Contour>, min_area: f64, rule: SecondRank) -> RankedResult {
    let mut ranked: Vec<RankedContour> = contours
        .into_iter()
        .map(RankedContour::measure)
        .filter(|c| c.area > min_area)
        .collect();
    // Stable sort keeps discovery order for equal areas.
    ranked.sort_by(|a, b| b.area.total_cmp(&a.area));

    let total_area = ranked.iter().map(|c| c.area).sum();
    let second_index = rule.index(ranked.len());
    RankedResult {
        contours: ranked,
        total_area,
        second_index,
    }
}
