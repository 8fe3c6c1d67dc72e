//! Error types for agroclim operations

use crate::region::{Crop, RegionId};
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error is attributed to when reporting per-region
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading bands, masks or series from storage.
    Loading,
    /// Per-observation index computation and aggregation.
    IndexCalculation,
    /// Trend fitting and correlation.
    TrendAnalysis,
    /// Scenario-based yield projection.
    Projection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Loading => "loading",
            Stage::IndexCalculation => "index calculation",
            Stage::TrendAnalysis => "trend analysis",
            Stage::Projection => "projection",
        };
        write!(f, "{}", s)
    }
}

/// Which of a region's two input series fell short of the minimum
/// sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Climate,
    Vegetation,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Climate => write!(f, "climate"),
            SeriesKind::Vegetation => write!(f, "vegetation index"),
        }
    }
}

/// Main error type for agroclim operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    /// A band does not match the shape established by the red band.
    #[error("Band '{band}' size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    BandShapeMismatch {
        band: &'static str,
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    /// Too few usable pixels survived masking to aggregate an index.
    #[error("{region}: only {valid} of {total} pixels usable, below required fraction {required_fraction}")]
    InsufficientValidPixels {
        region: RegionId,
        valid: usize,
        total: usize,
        required_fraction: f64,
    },

    /// A time series is too short (or too degenerate) to fit a trend.
    #[error("{region}: {series} series has {len} usable samples, need at least {min}")]
    InsufficientHistory {
        region: RegionId,
        series: SeriesKind,
        len: usize,
        min: usize,
    },

    /// No sensitivity entry exists for the requested crop.
    #[error("{region}: no yield sensitivity entry for crop '{crop}'")]
    UnknownCropSensitivity { region: RegionId, crop: Crop },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The region the error refers to, if it carries one.
    pub fn region(&self) -> Option<&RegionId> {
        match self {
            Error::InsufficientValidPixels { region, .. }
            | Error::InsufficientHistory { region, .. }
            | Error::UnknownCropSensitivity { region, .. } => Some(region),
            _ => None,
        }
    }

    /// The pipeline stage this error is inherently tied to, if any.
    ///
    /// Parameter and I/O errors can surface from several stages, so they
    /// report `None` and callers supply the stage from context.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::InvalidDimensions { .. } | Error::BandShapeMismatch { .. } => {
                Some(Stage::Loading)
            }
            Error::InsufficientValidPixels { .. } => Some(Stage::IndexCalculation),
            Error::InsufficientHistory { .. } => Some(Stage::TrendAnalysis),
            Error::UnknownCropSensitivity { .. } => Some(Stage::Projection),
            _ => None,
        }
    }
}

/// Result type alias for agroclim operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions { rows: 0, cols: 10 };
        assert_eq!(err.to_string(), "Invalid grid dimensions: 0x10");

        let err = Error::InsufficientHistory {
            region: RegionId::new("wc-wheat"),
            series: SeriesKind::Climate,
            len: 2,
            min: 3,
        };
        assert_eq!(
            err.to_string(),
            "wc-wheat: climate series has 2 usable samples, need at least 3"
        );
    }

    #[test]
    fn test_error_region_and_stage() {
        let err = Error::InsufficientValidPixels {
            region: RegionId::new("fs-maize"),
            valid: 3,
            total: 100,
            required_fraction: 0.1,
        };
        assert_eq!(err.region().map(|r| r.as_str()), Some("fs-maize"));
        assert_eq!(err.stage(), Some(Stage::IndexCalculation));

        let err = Error::Other("oops".into());
        assert!(err.region().is_none());
        assert!(err.stage().is_none());
    }

    #[test]
    fn test_unknown_crop_message_names_both() {
        let err = Error::UnknownCropSensitivity {
            region: RegionId::new("kzn-sugar"),
            crop: Crop::Sorghum,
        };
        let msg = err.to_string();
        assert!(msg.contains("kzn-sugar"));
        assert!(msg.contains("sorghum"));
    }
}
