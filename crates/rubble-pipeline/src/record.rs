//! The terminal analysis record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::maintenance::{Assessment, MaintenanceRules, assess};
use crate::rank::{ContourRecord, RankedResult};
use crate::shape::ShapeDescriptors;
use crate::stats::AreaStatistics;
use crate::strategy::StrategyKind;

/// Everything one analysis run reports.
///
/// A record is immutable once built. Runs that find nothing, or fail
/// part-way, still produce a well-formed record with zero measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
    /// Source file, when the caller knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Strategy that produced the contours.
    pub algorithm_used: StrategyKind,
    /// Strategy confidence in `[0, 1]`.
    pub confidence: f64,
    /// Number of particles retained.
    pub contour_count: usize,
    /// Area of the largest particle.
    pub largest_area: f64,
    /// Area of the second particle.
    pub second_largest_area: f64,
    /// Perimeter of the largest particle.
    pub largest_perimeter: f64,
    /// Perimeter of the second particle.
    pub second_largest_perimeter: f64,
    /// Sum of all retained areas.
    pub total_area: f64,
    /// Largest area as a percentage of the total.
    pub area_ratio: f64,
    /// Wall-clock duration of the run.
    pub processing_time_seconds: f64,
    /// One row per retained particle, largest first.
    pub detailed_contours: Vec<ContourRecord>,
    /// Area distribution summary.
    #[serde(default)]
    pub area_statistics: AreaStatistics,
    /// Shape of the largest particle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub largest_shape: Option<ShapeDescriptors>,
    /// Shape of the second particle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_shape: Option<ShapeDescriptors>,
    /// Crusher health heuristic.
    pub assessment: Assessment,
    /// Why the run produced no measurements, if a stage failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// A zero-valued record for a run that found or measured nothing.
    #[must_use]
    pub fn empty(algorithm_used: StrategyKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            image_path: None,
            algorithm_used,
            confidence: 0.0,
            contour_count: 0,
            largest_area: 0.0,
            second_largest_area: 0.0,
            largest_perimeter: 0.0,
            second_largest_perimeter: 0.0,
            total_area: 0.0,
            area_ratio: 0.0,
            processing_time_seconds: 0.0,
            detailed_contours: Vec::new(),
            area_statistics: AreaStatistics::default(),
            largest_shape: None,
            second_shape: None,
            assessment: assess(0, 0.0, &MaintenanceRules::default()),
            error: None,
        }
    }

    /// Build a record from a ranked population.
    #[must_use]
    pub fn from_ranked(
        ranked: &RankedResult,
        algorithm_used: StrategyKind,
        confidence: f64,
        rules: &MaintenanceRules,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let largest = ranked.largest();
        let second = ranked.second();
        let area_ratio = ranked.area_ratio();
        Self {
            timestamp,
            image_path: None,
            algorithm_used,
            confidence,
            contour_count: ranked.count(),
            largest_area: largest.map_or(0.0, |c| c.area),
            second_largest_area: second.map_or(0.0, |c| c.area),
            largest_perimeter: largest.map_or(0.0, |c| c.perimeter),
            second_largest_perimeter: second.map_or(0.0, |c| c.perimeter),
            total_area: ranked.total_area(),
            area_ratio,
            processing_time_seconds: 0.0,
            detailed_contours: ranked.records(),
            area_statistics: AreaStatistics::from_areas(&ranked.areas()),
            largest_shape: largest.map(|c| ShapeDescriptors::of(&c.contour)),
            second_shape: second.map(|c| ShapeDescriptors::of(&c.contour)),
            assessment: assess(ranked.count(), area_ratio, rules),
            error: None,
        }
    }

    /// Set the source path.
    #[must_use]
    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// Second area as a percentage of the total, 0 when the total is 0.
    #[must_use]
    pub fn second_area_ratio(&self) -> f64 {
        if self.total_area > 0.0 {
            self.second_largest_area / self.total_area * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::maintenance::EquipmentStatus;
    use crate::rank::{SecondRank, filter_and_rank};
    use crate::types::{Contour, Point};

    fn rect(x: f64, w: f64, h: f64) -> Contour {
        Contour::new(vec![
            Point::new(x, 0.0),
            Point::new(x + w, 0.0),
            Point::new(x + w, h),
            Point::new(x, h),
        ])
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn empty_record_is_abnormal() {
        let r = AnalysisResult::empty(StrategyKind::Hybrid, timestamp());
        assert_eq!(r.contour_count, 0);
        assert_eq!(r.assessment.status, EquipmentStatus::Abnormal);
        assert!(r.detailed_contours.is_empty());
        assert!(r.second_area_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn from_ranked_fills_every_measurement() {
        let ranked = filter_and_rank(
            vec![rect(0.0, 30.0, 60.0), rect(100.0, 15.0, 30.0)],
            50.0,
            SecondRank::SkipSatellites,
        );
        let r = AnalysisResult::from_ranked(
            &ranked,
            StrategyKind::EdgeDetection,
            0.1,
            &MaintenanceRules::default(),
            timestamp(),
        );
        assert_eq!(r.contour_count, 2);
        assert!((r.largest_area - 1800.0).abs() < 1e-9);
        assert!((r.second_largest_area - 450.0).abs() < 1e-9);
        assert!((r.largest_perimeter - 180.0).abs() < 1e-9);
        assert!((r.second_largest_perimeter - 90.0).abs() < 1e-9);
        assert!((r.total_area - 2250.0).abs() < 1e-9);
        assert!((r.area_ratio - 80.0).abs() < 1e-9);
        assert!((r.second_area_ratio() - 20.0).abs() < 1e-9);
        assert_eq!(r.detailed_contours.len(), 2);
        assert_eq!(r.area_statistics.count, 2);
        assert!(r.largest_shape.is_some());
        assert_eq!(r.assessment.status, EquipmentStatus::NeedsAttention);
    }

    #[test]
    fn serde_round_trip_reproduces_every_field() {
        let original = AnalysisResult {
            timestamp: timestamp(),
            image_path: Some("samples/quarry-7.jpg".to_owned()),
            algorithm_used: StrategyKind::ColorSegmentation,
            confidence: 0.75,
            contour_count: 3,
            largest_area: 1800.5,
            second_largest_area: 450.25,
            largest_perimeter: 170.5,
            second_largest_perimeter: 75.75,
            total_area: 2500.0,
            area_ratio: 72.02,
            processing_time_seconds: 0.125,
            detailed_contours: vec![
                ContourRecord {
                    id: 1,
                    area: 1800.5,
                    perimeter: 170.5,
                },
                ContourRecord {
                    id: 2,
                    area: 450.25,
                    perimeter: 75.75,
                },
                ContourRecord {
                    id: 3,
                    area: 249.25,
                    perimeter: 60.0,
                },
            ],
            area_statistics: AreaStatistics {
                count: 3,
                total: 2500.0,
                mean: 833.5,
                std_dev: 690.5,
                min: 249.25,
                max: 1800.5,
                median: 450.25,
            },
            largest_shape: Some(ShapeDescriptors::default()),
            second_shape: None,
            assessment: Assessment {
                crushing_efficiency: 60.0,
                status: EquipmentStatus::NeedsAttention,
                recommendation: "Inspect crusher blades for wear".to_owned(),
            },
            error: None,
        };

        let json = serde_json::to_string_pretty(&original).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn serde_round_trip_is_exact_for_arbitrary_floats() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // Diagonal outlines give perimeters built from sqrt(2) steps.
        let octagon = Contour::new(vec![
            Point::new(10.0, 0.0),
            Point::new(23.0, 0.0),
            Point::new(33.0, 10.0),
            Point::new(33.0, 21.0),
            Point::new(23.0, 31.0),
            Point::new(10.0, 31.0),
            Point::new(0.0, 21.0),
            Point::new(0.0, 10.0),
        ]);
        let ranked = filter_and_rank(
            vec![octagon, rect(100.0, 15.0, 30.0)],
            50.0,
            SecondRank::SkipSatellites,
        );
        let mut r = AnalysisResult::from_ranked(
            &ranked,
            StrategyKind::Hybrid,
            0.1,
            &MaintenanceRules::default(),
            timestamp(),
        );

        let round_trip = |r: &AnalysisResult| -> AnalysisResult {
            serde_json::from_str(&serde_json::to_string(r).unwrap()).unwrap()
        };
        assert_eq!(round_trip(&r), r);

        // Values that the default float parser reads back one ULP off.
        r.largest_perimeter = 911.676_072_677_620_1;
        r.second_largest_perimeter = 3_856.682_919_414_944_5;
        assert_eq!(round_trip(&r), r);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5_000 {
            r.largest_perimeter = rng.gen_range(0.0..5_000.0);
            r.second_largest_perimeter = rng.gen_range(0.0..5_000.0);
            r.processing_time_seconds = rng.r#gen::<f64>();
            r.confidence = rng.r#gen::<f64>();
            r.area_statistics.std_dev = rng.gen_range(0.0..1e6);
            assert_eq!(round_trip(&r), r);
        }
    }

    #[test]
    fn timestamp_serializes_as_rfc3339() {
        let r = AnalysisResult::empty(StrategyKind::EdgeDetection, timestamp());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["timestamp"], "2026-03-14T09:26:53Z");
        assert_eq!(json["algorithm_used"], "edge_detection");
    }
}
