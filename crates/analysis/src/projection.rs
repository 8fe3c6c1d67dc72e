//! Scenario-based yield projection
//!
//! Extrapolates a region's observed climate trends to a target year,
//! layers an emission scenario's decadal forcing on top, and converts
//! the combined temperature and rainfall deltas into a yield change via
//! per-crop sensitivity coefficients.
//!
//! Projections are deliberately linear. The aim is a defensible
//! first-order estimate with an honest uncertainty band, not crop
//! modelling; the band widens with the projection horizon and the
//! central value is clipped to a plausibility range.

use agroclim_core::{
    Crop, CropSensitivityTable, EmissionScenario, Error, RegionalTrendSummary, Result,
    YieldProjection,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::trend::DAYS_PER_YEAR;

/// Parameters controlling projection behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    /// Crop sensitivity lookup. Missing crops fail, never default.
    pub sensitivity: CropSensitivityTable,
    /// Lower plausibility bound for projected change, percent.
    pub clip_low_pct: f64,
    /// Upper plausibility bound for projected change, percent.
    pub clip_high_pct: f64,
    /// Half-width growth of the uncertainty band, percent per year of
    /// horizon.
    pub uncertainty_pct_per_year: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        ProjectionParams {
            sensitivity: CropSensitivityTable::default(),
            clip_low_pct: -80.0,
            clip_high_pct: 20.0,
            uncertainty_pct_per_year: 0.75,
        }
    }
}

impl ProjectionParams {
    pub fn validate(&self) -> Result<()> {
        if !self.clip_low_pct.is_finite()
            || !self.clip_high_pct.is_finite()
            || self.clip_low_pct >= self.clip_high_pct
        {
            return Err(Error::InvalidParameter {
                name: "clip_range",
                value: format!("[{}, {}]", self.clip_low_pct, self.clip_high_pct),
                reason: "bounds must be finite with low < high".to_string(),
            });
        }
        if !self.uncertainty_pct_per_year.is_finite() || self.uncertainty_pct_per_year < 0.0 {
            return Err(Error::InvalidParameter {
                name: "uncertainty_pct_per_year",
                value: self.uncertainty_pct_per_year.to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Project the yield change for one region, crop and scenario at a
/// target year.
///
/// The projection horizon runs from the summary's last observed date to
/// the middle of the target year (1 July). Observed slopes extrapolate
/// linearly over the horizon; scenario forcing adds on top at its
/// decadal rate. The observed rainfall trend converts from mm/yr to
/// percent using the summary's mean rainfall; a non-positive mean
/// disables that term with a warning rather than dividing by it.
///
/// Out-of-range results are clipped and flagged via
/// [`YieldProjection::clipped`], with a warning log. Requesting a crop
/// absent from the sensitivity table is an error.
pub fn project_yield(
    summary: &RegionalTrendSummary,
    crop: Crop,
    scenario: &EmissionScenario,
    target_year: i32,
    params: &ProjectionParams,
) -> Result<YieldProjection> {
    params.validate()?;
    let sensitivity =
        params
            .sensitivity
            .get(crop)
            .ok_or_else(|| Error::UnknownCropSensitivity {
                region: summary.region.clone(),
                crop,
            })?;

    let target = NaiveDate::from_ymd_opt(target_year, 7, 1).ok_or_else(|| {
        Error::InvalidParameter {
            name: "target_year",
            value: target_year.to_string(),
            reason: "not a representable calendar year".to_string(),
        }
    })?;
    let horizon_years =
        target.signed_duration_since(summary.span.end).num_days() as f64 / DAYS_PER_YEAR;
    if horizon_years <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "target_year",
            value: target_year.to_string(),
            reason: format!(
                "projection target must fall after the last observed date {}",
                summary.span.end
            ),
        });
    }

    let temperature_delta_c = summary.temperature_slope * horizon_years
        + scenario.temperature_per_decade_c * horizon_years / 10.0;

    let observed_rain_pct_per_year = if summary.mean_rainfall_mm > 0.0 {
        summary.rainfall_slope / summary.mean_rainfall_mm * 100.0
    } else {
        warn!(
            region = %summary.region,
            mean_rainfall_mm = summary.mean_rainfall_mm,
            "non-positive mean rainfall, dropping observed rainfall trend from projection"
        );
        0.0
    };
    let rainfall_delta_pct = observed_rain_pct_per_year * horizon_years
        + scenario.rainfall_per_decade_pct * horizon_years / 10.0;

    let raw = temperature_delta_c * sensitivity.temperature_pct_per_c
        + rainfall_delta_pct * sensitivity.rainfall_pct_per_pct;

    let clipped = raw < params.clip_low_pct || raw > params.clip_high_pct;
    let yield_change_pct = raw.clamp(params.clip_low_pct, params.clip_high_pct);
    if clipped {
        warn!(
            region = %summary.region,
            crop = %crop,
            raw_pct = raw,
            low = params.clip_low_pct,
            high = params.clip_high_pct,
            "projected yield change outside plausibility range, clipping"
        );
    }

    // The band expresses horizon uncertainty around the reported value;
    // it is not re-clipped.
    let margin = params.uncertainty_pct_per_year * horizon_years;

    Ok(YieldProjection {
        region: summary.region.clone(),
        crop,
        scenario: scenario.label.clone(),
        target_year,
        yield_change_pct,
        band_low_pct: yield_change_pct - margin,
        band_high_pct: yield_change_pct + margin,
        temperature_delta_c,
        rainfall_delta_pct,
        clipped,
    })
}

/// Project every year from `first_year` to `last_year` inclusive.
pub fn project_yield_series(
    summary: &RegionalTrendSummary,
    crop: Crop,
    scenario: &EmissionScenario,
    first_year: i32,
    last_year: i32,
    params: &ProjectionParams,
) -> Result<Vec<YieldProjection>> {
    if first_year > last_year {
        return Err(Error::InvalidParameter {
            name: "year_range",
            value: format!("{}..={}", first_year, last_year),
            reason: "first year must not exceed last year".to_string(),
        });
    }
    (first_year..=last_year)
        .map(|year| project_yield(summary, crop, scenario, year, params))
        .collect()
}
