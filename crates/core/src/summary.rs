//! Regional trend summaries and risk classification

use crate::region::RegionId;
use crate::series::DateRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity band a risk score falls into.
///
/// Thresholds follow the reporting convention of the original South
/// African study: `< 0.25` low, `< 0.5` moderate, `< 0.75` high,
/// otherwise very high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Classify a score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            RiskLevel::Low
        } else if score < 0.5 {
            RiskLevel::Moderate
        } else if score < 0.75 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very high",
        };
        write!(f, "{}", s)
    }
}

/// The deterioration signal contributing most to a region's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDriver {
    /// Declining rainfall.
    Drought,
    /// Rising temperature.
    HeatStress,
    /// Declining vegetation index.
    VegetationDecline,
}

impl fmt::Display for RiskDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskDriver::Drought => "drought",
            RiskDriver::HeatStress => "heat stress",
            RiskDriver::VegetationDecline => "vegetation decline",
        };
        write!(f, "{}", s)
    }
}

/// Fitted trends, correlation and composite risk for one region.
///
/// Slopes are per-year rates from ordinary least squares against
/// fractional years. `risk_score` lies in `[0, 1]`;
/// `fallback_normalization` is `true` when the score was produced by the
/// single-region fallback formula rather than batch min-max scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalTrendSummary {
    pub region: RegionId,
    /// Earliest to latest observed date across both input series.
    pub span: DateRange,
    /// Temperature trend, degrees Celsius per year.
    pub temperature_slope: f64,
    /// Rainfall trend, millimetres per year.
    pub rainfall_slope: f64,
    /// NDVI trend, index units per year.
    pub ndvi_slope: f64,
    /// Pearson correlation between aligned NDVI and rainfall samples.
    /// `0.0` when fewer than three pairs aligned or a series was
    /// constant.
    pub ndvi_rainfall_correlation: f64,
    /// Number of date-aligned pairs that entered the correlation.
    pub correlation_pairs: usize,
    /// Mean temperature over the climate series, degrees Celsius.
    pub mean_temperature_c: f64,
    /// Mean rainfall over the climate series, millimetres.
    pub mean_rainfall_mm: f64,
    /// Fraction of climate samples flagged as drought, in `[0, 1]`.
    pub drought_frequency: f64,
    /// Composite risk score in `[0, 1]`.
    pub risk_score: f64,
    /// `true` when the score comes from the single-region fallback.
    pub fallback_normalization: bool,
    /// Signal contributing most to the score.
    pub dominant_driver: RiskDriver,
}

impl RegionalTrendSummary {
    /// Severity band for `risk_score`.
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.249), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.25), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.499), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.75), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Moderate);
        assert!(RiskLevel::High < RiskLevel::VeryHigh);
    }

    #[test]
    fn test_display() {
        assert_eq!(RiskLevel::VeryHigh.to_string(), "very high");
        assert_eq!(RiskDriver::HeatStress.to_string(), "heat stress");
    }
}
