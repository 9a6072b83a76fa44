//! Crusher health heuristic.
//!
//! Maps the particle count and the largest particle's share of the total
//! area to a crushing efficiency, an equipment status, and a maintenance
//! recommendation. A dominant particle means the crusher is letting
//! oversize material through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Coarse equipment condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    /// Output looks normal.
    Good,
    /// Oversize particles dominate the sample.
    NeedsAttention,
    /// No particles were detected at all.
    Abnormal,
}

impl EquipmentStatus {
    /// Human-readable status label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsAttention => "needs attention",
            Self::Abnormal => "abnormal",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Thresholds and efficiencies for [`assess`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceRules {
    /// Area ratio (percent) above which the sample needs attention.
    pub attention_ratio: f64,
    /// Area ratio (percent) below which the sample is finely crushed.
    pub fine_ratio: f64,
    /// Efficiency reported when the sample needs attention.
    pub attention_efficiency: f64,
    /// Efficiency reported for a finely crushed sample.
    pub fine_efficiency: f64,
    /// Efficiency reported between the two ratios.
    pub nominal_efficiency: f64,
}

impl MaintenanceRules {
    /// Default for [`attention_ratio`](Self::attention_ratio).
    pub const DEFAULT_ATTENTION_RATIO: f64 = 50.0;
    /// Default for [`fine_ratio`](Self::fine_ratio).
    pub const DEFAULT_FINE_RATIO: f64 = 10.0;

    /// Check that the thresholds are ordered and finite.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `fine_ratio` exceeds
    /// `attention_ratio` or any value is not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let values = [
            self.attention_ratio,
            self.fine_ratio,
            self.attention_efficiency,
            self.fine_efficiency,
            self.nominal_efficiency,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "maintenance rules must be finite".to_owned(),
            ));
        }
        if self.fine_ratio > self.attention_ratio {
            return Err(PipelineError::InvalidConfig(format!(
                "maintenance fine_ratio ({}) must not exceed attention_ratio ({})",
                self.fine_ratio, self.attention_ratio,
            )));
        }
        Ok(())
    }
}

impl Default for MaintenanceRules {
    fn default() -> Self {
        Self {
            attention_ratio: Self::DEFAULT_ATTENTION_RATIO,
            fine_ratio: Self::DEFAULT_FINE_RATIO,
            attention_efficiency: 60.0,
            fine_efficiency: 90.0,
            nominal_efficiency: 85.0,
        }
    }
}

/// Outcome of the health heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Estimated crushing efficiency in percent.
    pub crushing_efficiency: f64,
    /// Equipment condition.
    pub status: EquipmentStatus,
    /// What the operator should do next.
    pub recommendation: String,
}

/// Assess crusher health from a ranked sample.
///
/// | Condition                    | Status           | Efficiency |
/// |------------------------------|------------------|------------|
/// | no contours                  | abnormal         | 0          |
/// | ratio > `attention_ratio`    | needs attention  | 60         |
/// | ratio < `fine_ratio`         | good             | 90         |
/// | otherwise                    | good             | 85         |
#[must_use]
pub fn assess(contour_count: usize, area_ratio: f64, rules: &MaintenanceRules) -> Assessment {
    let (crushing_efficiency, status, recommendation) = if contour_count == 0 {
        (
            0.0,
            EquipmentStatus::Abnormal,
            "Equipment requires immediate inspection",
        )
    } else if area_ratio > rules.attention_ratio {
        (
            rules.attention_efficiency,
            EquipmentStatus::NeedsAttention,
            "Inspect crusher blades for wear",
        )
    } else if area_ratio < rules.fine_ratio {
        (
            rules.fine_efficiency,
            EquipmentStatus::Good,
            "Equipment operating normally, continue monitoring",
        )
    } else {
        (
            rules.nominal_efficiency,
            EquipmentStatus::Good,
            "Perform routine maintenance as scheduled",
        )
    };

    Assessment {
        crushing_efficiency,
        status,
        recommendation: recommendation.to_owned(),
    }
}
