//! Pipeline configuration
//!
//! One deserializable struct gathers every tunable of the pipeline.
//! Each field falls back to its documented default when absent, so a
//! JSON config may override just the knobs it cares about.

use agroclim_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::index::IndexParams;
use crate::projection::ProjectionParams;
use crate::risk::RiskWeights;

/// Full pipeline configuration with per-field defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Index masking and aggregation thresholds.
    pub index: IndexParams,
    /// Maximum date distance when pairing NDVI with rainfall, days.
    pub correlation_tolerance_days: i64,
    /// Relative weights of the risk signals.
    pub risk_weights: RiskWeights,
    /// Sensitivities, clipping and uncertainty for projections.
    pub projection: ProjectionParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            index: IndexParams::default(),
            correlation_tolerance_days: Self::DEFAULT_TOLERANCE_DAYS,
            risk_weights: RiskWeights::default(),
            projection: ProjectionParams::default(),
        }
    }
}

impl PipelineConfig {
    pub const DEFAULT_TOLERANCE_DAYS: i64 = 30;

    /// Check every section; the first offending parameter is reported.
    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        if self.correlation_tolerance_days < 0 {
            return Err(Error::InvalidParameter {
                name: "correlation_tolerance_days",
                value: self.correlation_tolerance_days.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        self.risk_weights.validate()?;
        self.projection.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.correlation_tolerance_days, 30);
        assert!((config.index.epsilon - 1e-6).abs() < 1e-18);
        assert!((config.index.min_valid_fraction - 0.10).abs() < 1e-12);
        assert!((config.projection.clip_low_pct + 80.0).abs() < 1e-12);
        assert!((config.projection.clip_high_pct - 20.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{ "correlation_tolerance_days": 14, "risk_weights": { "rainfall": 2.0 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.correlation_tolerance_days, 14);
        assert!((config.risk_weights.rainfall - 2.0).abs() < 1e-12);
        // Untouched sections keep their defaults.
        assert!((config.risk_weights.temperature - 1.0).abs() < 1e-12);
        assert!((config.index.min_valid_fraction - 0.10).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_flags_bad_sections() {
        let mut config = PipelineConfig::default();
        config.correlation_tolerance_days = -1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.index.epsilon = -1.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.projection.uncertainty_pct_per_year = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
