//! Time-series sample types
//!
//! Samples are plain records with validating constructors. Fields stay
//! public for ergonomic access and serde round-trips of trusted
//! fixtures; code that assembles samples from untrusted input should go
//! through [`ClimateSample::new`] / [`VegetationIndexSample::new`].

use crate::error::{Error, Result};
use crate::region::RegionId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One climate record for a region: mean temperature, total rainfall
/// and a drought flag for the sampling period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    pub region: RegionId,
    pub date: NaiveDate,
    /// Mean air temperature over the period, degrees Celsius.
    pub temperature_c: f64,
    /// Total rainfall over the period, millimetres. Never negative.
    pub rainfall_mm: f64,
    /// Whether the period was classified as drought by the provider.
    #[serde(default)]
    pub drought: bool,
}

impl ClimateSample {
    pub fn new(
        region: impl Into<RegionId>,
        date: NaiveDate,
        temperature_c: f64,
        rainfall_mm: f64,
        drought: bool,
    ) -> Result<Self> {
        if !temperature_c.is_finite() {
            return Err(Error::InvalidParameter {
                name: "temperature_c",
                value: temperature_c.to_string(),
                reason: "must be finite".to_string(),
            });
        }
        if !rainfall_mm.is_finite() || rainfall_mm < 0.0 {
            return Err(Error::InvalidParameter {
                name: "rainfall_mm",
                value: rainfall_mm.to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
        Ok(ClimateSample {
            region: region.into(),
            date,
            temperature_c,
            rainfall_mm,
            drought,
        })
    }
}

/// A regional vegetation index aggregate for one acquisition date.
///
/// Produced by the index calculator from a raster observation; `ndvi`
/// is the mean over usable pixels and `coverage` the fraction of pixels
/// that were usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationIndexSample {
    pub region: RegionId,
    pub date: NaiveDate,
    /// Mean NDVI over usable pixels, in `[-1, 1]`.
    pub ndvi: f64,
    /// Fraction of pixels that contributed, in `[0, 1]`.
    pub coverage: f64,
}

impl VegetationIndexSample {
    pub fn new(
        region: impl Into<RegionId>,
        date: NaiveDate,
        ndvi: f64,
        coverage: f64,
    ) -> Result<Self> {
        if !(-1.0..=1.0).contains(&ndvi) || ndvi.is_nan() {
            return Err(Error::InvalidParameter {
                name: "ndvi",
                value: ndvi.to_string(),
                reason: "must lie in [-1, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&coverage) || coverage.is_nan() {
            return Err(Error::InvalidParameter {
                name: "coverage",
                value: coverage.to_string(),
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        Ok(VegetationIndexSample {
            region: region.into(),
            date,
            ndvi,
            coverage,
        })
    }
}

/// Inclusive date range, used for loader queries and result spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidParameter {
                name: "date_range",
                value: format!("{}..{}", start, end),
                reason: "start must not be after end".to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of whole days between start and end.
    pub fn span_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days()
    }
}
