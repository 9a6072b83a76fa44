//! Per-contour CSV export with physical units.
//!
//! One header line, then one row per ranked contour:
//!
//! ```text
//! ID,Area,Perimeter,Area_mm2,Perimeter_mm
//! 1,1800.00,170.00,72.00,34.00
//! ```
//!
//! Pixel measurements are converted with a linear [`ScaleRatio`]
//! (pixels per millimeter): `Area_mm2 = area / scale²`,
//! `Perimeter_mm = perimeter / scale`.
//!
//! This is a pure function with no I/O. It returns a `String`.

use std::fmt::Write;

use rubble_pipeline::ContourRecord;

use crate::ExportError;

/// CSV header line (without trailing newline).
pub const CSV_HEADER: &str = "ID,Area,Perimeter,Area_mm2,Perimeter_mm";

/// Pixels per millimeter. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleRatio(f64);

impl ScaleRatio {
    /// One pixel per millimeter: physical columns equal pixel columns.
    pub const UNIT: Self = Self(1.0);

    /// Create a scale ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidScale`] unless `pixels_per_mm` is
    /// finite and greater than zero.
    pub fn new(pixels_per_mm: f64) -> Result<Self, ExportError> {
        if pixels_per_mm.is_finite() && pixels_per_mm > 0.0 {
            Ok(Self(pixels_per_mm))
        } else {
            Err(ExportError::InvalidScale(pixels_per_mm))
        }
    }

    /// Derive a ratio from a reference object of known size.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidScale`] unless both lengths are
    /// finite and positive.
    pub fn calibrate(length_px: f64, length_mm: f64) -> Result<Self, ExportError> {
        if !(length_mm.is_finite() && length_mm > 0.0) {
            return Err(ExportError::InvalidScale(length_mm));
        }
        Self::new(length_px / length_mm)
    }

    /// Pixels per millimeter.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Convert a pixel length to millimeters.
    #[must_use]
    pub fn length_mm(self, pixels: f64) -> f64 {
        pixels / self.0
    }

    /// Convert a pixel area to square millimeters.
    #[must_use]
    pub fn area_mm2(self, pixels: f64) -> f64 {
        pixels / (self.0 * self.0)
    }
}

impl Default for ScaleRatio {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Serialize contour records to CSV.
#[must_use = "returns the CSV text"]
pub fn to_csv(records: &[ContourRecord], scale: ScaleRatio) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 40);
    let _ = writeln!(out, "{CSV_HEADER}");
    for r in records {
        let _ = writeln!(
            out,
            "{},{:.2},{:.2},{:.2},{:.2}",
            r.id,
            r.area,
            r.perimeter,
            scale.area_mm2(r.area),
            scale.length_mm(r.perimeter),
        );
    }
    out
}
