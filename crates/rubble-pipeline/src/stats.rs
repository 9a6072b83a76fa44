//! Distribution statistics over particle areas.

use serde::{Deserialize, Serialize};

/// Summary of a set of particle areas.
///
/// All fields are 0 for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaStatistics {
    /// Number of areas.
    pub count: usize,
    /// Sum of all areas.
    pub total: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Smallest area.
    pub min: f64,
    /// Largest area.
    pub max: f64,
    /// Median (mean of the two middle values for even counts).
    pub median: f64,
}

impl AreaStatistics {
    /// Compute statistics over `areas` in any order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_areas(areas: &[f64]) -> Self {
        if areas.is_empty() {
            return Self::default();
        }

        let mut sorted = areas.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let n = count as f64;
        let total: f64 = sorted.iter().sum();
        let mean = total / n;
        let variance = sorted.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };

        Self {
            count,
            total,
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            median,
        }
    }

    /// Coefficient of variation (`std_dev / mean`), 0 when the mean is 0.
    #[must_use]
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.std_dev / self.mean
        } else {
            0.0
        }
    }
}
