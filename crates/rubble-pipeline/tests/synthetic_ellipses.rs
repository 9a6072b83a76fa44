//! Integration test: two filled ellipses of known area through the full
//! edge-detection analysis.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};
use rubble_pipeline::diagnostics::Clock;
use rubble_pipeline::{AlgorithmChoice, AnalysisConfig, EquipmentStatus, StrategyKind};

struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 600x400 canvas, background gray 40, particles gray 220.
///
/// Pixels are lit when their center lies inside the ellipse. The large
/// ellipse (a = 30, b = 18.5) and the small circle (r = 11.72) measure
/// close to 1800 and 450 px² once traced.
fn two_particles() -> DynamicImage {
    let inside = |x: f64, y: f64, cx: f64, cy: f64, a: f64, b: f64| {
        ((x - cx) / a).powi(2) + ((y - cy) / b).powi(2) <= 1.0
    };
    DynamicImage::ImageRgb8(RgbImage::from_fn(600, 400, |x, y| {
        let (px, py) = (f64::from(x), f64::from(y));
        if inside(px, py, 180.0, 200.0, 30.0, 18.5) || inside(px, py, 420.0, 180.0, 11.72, 11.72) {
            image::Rgb([220, 220, 220])
        } else {
            image::Rgb([40, 40, 40])
        }
    }))
}

fn within(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected * tolerance
}

#[test]
fn edge_detection_measures_both_particles() {
    let config = AnalysisConfig {
        strategy: AlgorithmChoice::EdgeDetection,
        ..AnalysisConfig::default()
    };
    let outcome = rubble_pipeline::analyze_staged(&two_particles(), &config, &StdClock)
        .expect("image is large enough");
    let record = &outcome.record;

    eprintln!(
        "contours={} largest={:.1} second={:.1} ratio={:.2}",
        record.contour_count, record.largest_area, record.second_largest_area, record.area_ratio,
    );
    if let Some(ref diagnostics) = outcome.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    assert_eq!(record.algorithm_used, StrategyKind::EdgeDetection);
    assert_eq!(record.contour_count, 2);
    assert!(
        within(record.largest_area, 1800.0, 0.05),
        "largest area {} not within 5% of 1800",
        record.largest_area,
    );
    assert!(
        within(record.second_largest_area, 450.0, 0.05),
        "second area {} not within 5% of 450",
        record.second_largest_area,
    );
    assert!(
        within(record.area_ratio, 80.0, 0.05),
        "area ratio {} not within 5% of 80",
        record.area_ratio,
    );
    assert!((record.total_area - record.largest_area - record.second_largest_area).abs() < 1e-6);
    assert_eq!(record.assessment.status, EquipmentStatus::NeedsAttention);

    // Largest particle centered where it was drawn.
    let shape = record.largest_shape.expect("largest particle has a shape");
    assert!((shape.centroid.x - 180.0).abs() < 2.0);
    assert!((shape.centroid.y - 200.0).abs() < 2.0);
    assert!(shape.aspect_ratio > 1.4);
}

#[test]
fn auto_selects_edge_detection_for_gray_sample() {
    let record =
        rubble_pipeline::analyze(&two_particles(), &AnalysisConfig::default(), &StdClock).unwrap();
    assert_eq!(record.algorithm_used, StrategyKind::EdgeDetection);
    assert_eq!(record.contour_count, 2);
    assert_eq!(record.detailed_contours[0].id, 1);
    assert!(record.detailed_contours[0].area >= record.detailed_contours[1].area);
}

#[test]
fn raising_min_area_drops_small_particle() {
    let config = AnalysisConfig {
        strategy: AlgorithmChoice::EdgeDetection,
        min_contour_area: 1000,
        ..AnalysisConfig::default()
    };
    let record = rubble_pipeline::analyze(&two_particles(), &config, &StdClock).unwrap();
    assert_eq!(record.contour_count, 1);
    assert!(record.second_largest_area.abs() < f64::EPSILON);
    assert!((record.area_ratio - 100.0).abs() < 1e-9);
}
