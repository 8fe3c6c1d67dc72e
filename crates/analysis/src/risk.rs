//! Composite risk scoring
//!
//! Folds three deterioration signals into one `[0, 1]` score per
//! region: rainfall decline (`-rainfall_slope`), warming
//! (`temperature_slope`) and vegetation decline (`-ndvi_slope`). Signs
//! are flipped so that larger always means worse.
//!
//! Across a batch of two or more regions each signal is min-max scaled
//! over the batch before weighting, so scores express relative standing
//! within that batch. A single region has no batch context; it gets the
//! cruder fallback formula and its summary is flagged accordingly.
//!
//! Scoring touches each region independently after two commutative
//! min/max folds, so batch order never changes any region's score.

use agroclim_core::{Error, RegionalTrendSummary, Result, RiskDriver};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative weights of the three deterioration signals.
///
/// Weights are normalized by their sum, so only ratios matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub rainfall: f64,
    pub temperature: f64,
    pub vegetation: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            rainfall: 1.0,
            temperature: 1.0,
            vegetation: 1.0,
        }
    }
}

impl RiskWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("rainfall", self.rainfall),
            ("temperature", self.temperature),
            ("vegetation", self.vegetation),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidParameter {
                    name: "risk_weights",
                    value: w.to_string(),
                    reason: format!("{} weight must be finite and non-negative", name),
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "risk_weights",
                value: self.total().to_string(),
                reason: "at least one weight must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn as_array(&self) -> [f64; 3] {
        [self.rainfall, self.temperature, self.vegetation]
    }

    fn total(&self) -> f64 {
        self.rainfall + self.temperature + self.vegetation
    }
}

/// Signal order: rainfall decline, warming, vegetation decline.
const DRIVERS: [RiskDriver; 3] = [
    RiskDriver::Drought,
    RiskDriver::HeatStress,
    RiskDriver::VegetationDecline,
];

#[inline]
fn raw_signals(s: &RegionalTrendSummary) -> [f64; 3] {
    [-s.rainfall_slope, s.temperature_slope, -s.ndvi_slope]
}

/// First strict maximum wins, so ties resolve in `DRIVERS` order.
fn dominant(contributions: [f64; 3]) -> RiskDriver {
    let mut best = 0;
    for i in 1..3 {
        if contributions[i] > contributions[best] {
            best = i;
        }
    }
    DRIVERS[best]
}

/// Score one summary without batch context and flag it as fallback.
///
/// The score is the weighted mean of the raw signed signals clamped to
/// `[0, 1]`. Raw slopes live on wildly different scales (mm/yr versus
/// index units/yr), which is exactly why the result carries the
/// `fallback_normalization` flag.
pub fn apply_fallback(summary: &mut RegionalTrendSummary, weights: &RiskWeights) {
    let w = weights.as_array();
    let sig = raw_signals(summary);
    let contributions = [w[0] * sig[0], w[1] * sig[1], w[2] * sig[2]];
    let raw = (contributions[0] + contributions[1] + contributions[2]) / weights.total();
    summary.risk_score = raw.clamp(0.0, 1.0);
    summary.fallback_normalization = true;
    summary.dominant_driver = dominant(contributions);
}

/// Rescale risk scores across a batch using per-signal min-max
/// normalization.
///
/// With fewer than two regions, or when every region is tied on every
/// signal, each summary keeps (or regains) its flagged fallback score.
/// Otherwise scores are replaced, `fallback_normalization` is cleared
/// and the dominant driver is recomputed from the scaled contributions.
/// A signal on which the whole batch is tied contributes the midpoint
/// `0.5` for every region.
pub fn score_batch(summaries: &mut [RegionalTrendSummary], weights: &RiskWeights) -> Result<()> {
    weights.validate()?;

    if summaries.len() < 2 {
        for s in summaries.iter_mut() {
            apply_fallback(s, weights);
        }
        return Ok(());
    }

    let mut mins = [f64::INFINITY; 3];
    let mut maxs = [f64::NEG_INFINITY; 3];
    for s in summaries.iter() {
        let sig = raw_signals(s);
        for i in 0..3 {
            mins[i] = mins[i].min(sig[i]);
            maxs[i] = maxs[i].max(sig[i]);
        }
    }
    let spans = [maxs[0] - mins[0], maxs[1] - mins[1], maxs[2] - mins[2]];

    if spans.iter().all(|&sp| sp == 0.0) {
        debug!(
            regions = summaries.len(),
            "batch tied on every signal, keeping fallback scores"
        );
        for s in summaries.iter_mut() {
            apply_fallback(s, weights);
        }
        return Ok(());
    }

    let w = weights.as_array();
    let total = weights.total();
    for s in summaries.iter_mut() {
        let sig = raw_signals(s);
        let mut contributions = [0.0; 3];
        for i in 0..3 {
            let scaled = if spans[i] > 0.0 {
                (sig[i] - mins[i]) / spans[i]
            } else {
                0.5
            };
            contributions[i] = w[i] * scaled;
        }
        let score = (contributions[0] + contributions[1] + contributions[2]) / total;
        s.risk_score = score.clamp(0.0, 1.0);
        s.fallback_normalization = false;
        s.dominant_driver = dominant(contributions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agroclim_core::{DateRange, RegionId};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn summary(id: &str, rain_slope: f64, temp_slope: f64, ndvi_slope: f64) -> RegionalTrendSummary {
        RegionalTrendSummary {
            region: RegionId::new(id),
            span: DateRange::new(date(2010, 1, 1), date(2023, 12, 31)).unwrap(),
            temperature_slope: temp_slope,
            rainfall_slope: rain_slope,
            ndvi_slope,
            ndvi_rainfall_correlation: 0.0,
            correlation_pairs: 0,
            mean_temperature_c: 20.0,
            mean_rainfall_mm: 60.0,
            drought_frequency: 0.0,
            risk_score: 0.0,
            fallback_normalization: true,
            dominant_driver: RiskDriver::Drought,
        }
    }

    #[test]
    fn test_weights_validation() {
        assert!(RiskWeights::default().validate().is_ok());
        let neg = RiskWeights { rainfall: -1.0, ..Default::default() };
        assert!(neg.validate().is_err());
        let zero = RiskWeights { rainfall: 0.0, temperature: 0.0, vegetation: 0.0 };
        assert!(zero.validate().is_err());
        // A single positive weight is enough.
        let one = RiskWeights { rainfall: 0.0, temperature: 2.0, vegetation: 0.0 };
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_fallback_known_value() {
        // Signals: 0.3, 0.3, 0.3; equal weights give mean 0.3.
        let mut s = summary("a", -0.3, 0.3, -0.3);
        apply_fallback(&mut s, &RiskWeights::default());
        assert!((s.risk_score - 0.3).abs() < 1e-12, "got {}", s.risk_score);
        assert!(s.fallback_normalization);
    }

    #[test]
    fn test_fallback_clamps() {
        // Strong drying in mm/yr dwarfs the unit interval.
        let mut s = summary("a", -8.0, 0.1, -0.004);
        apply_fallback(&mut s, &RiskWeights::default());
        assert_eq!(s.risk_score, 1.0);
        assert_eq!(s.dominant_driver, RiskDriver::Drought);

        // Improving on every front clamps to zero.
        let mut s = summary("b", 5.0, -0.2, 0.01);
        apply_fallback(&mut s, &RiskWeights::default());
        assert_eq!(s.risk_score, 0.0);
    }

    #[test]
    fn test_single_region_batch_uses_fallback() {
        let mut batch = vec![summary("a", -0.3, 0.3, -0.3)];
        score_batch(&mut batch, &RiskWeights::default()).unwrap();
        assert!(batch[0].fallback_normalization);
        assert!((batch[0].risk_score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_batch_min_max_extremes() {
        // Region a is worst on every signal, b best.
        let mut batch = vec![
            summary("a", -8.0, 0.12, -0.006),
            summary("b", 1.0, 0.01, 0.001),
        ];
        score_batch(&mut batch, &RiskWeights::default()).unwrap();
        assert!((batch[0].risk_score - 1.0).abs() < 1e-12);
        assert!((batch[1].risk_score - 0.0).abs() < 1e-12);
        assert!(!batch[0].fallback_normalization);
        assert!(!batch[1].fallback_normalization);
    }

    #[test]
    fn test_batch_tied_signal_contributes_midpoint() {
        // Rainfall slope identical, vegetation identical; only
        // temperature separates the two regions.
        let mut batch = vec![
            summary("a", -2.0, 0.10, -0.002),
            summary("b", -2.0, 0.02, -0.002),
        ];
        score_batch(&mut batch, &RiskWeights::default()).unwrap();
        // (0.5 + 1.0 + 0.5) / 3 and (0.5 + 0.0 + 0.5) / 3.
        assert!((batch[0].risk_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((batch[1].risk_score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_all_tied_keeps_fallback() {
        let mut batch = vec![
            summary("a", -0.3, 0.3, -0.3),
            summary("b", -0.3, 0.3, -0.3),
        ];
        score_batch(&mut batch, &RiskWeights::default()).unwrap();
        assert!(batch[0].fallback_normalization);
        assert!(batch[1].fallback_normalization);
        assert_eq!(batch[0].risk_score, batch[1].risk_score);
    }

    #[test]
    fn test_batch_order_invariance() {
        let mk = || {
            vec![
                summary("a", -5.2, 0.08, -0.004),
                summary("b", -1.1, 0.11, -0.001),
                summary("c", 0.4, 0.03, 0.002),
            ]
        };
        let mut forward = mk();
        score_batch(&mut forward, &RiskWeights::default()).unwrap();

        let mut reversed = mk();
        reversed.reverse();
        score_batch(&mut reversed, &RiskWeights::default()).unwrap();

        for f in &forward {
            let r = reversed.iter().find(|r| r.region == f.region).unwrap();
            assert_eq!(f.risk_score.to_bits(), r.risk_score.to_bits());
            assert_eq!(f.dominant_driver, r.dominant_driver);
        }
    }

    #[test]
    fn test_dominant_driver_and_tie_order() {
        let mut batch = vec![
            summary("a", -1.0, 0.50, -0.001),
            summary("b", -4.0, 0.01, -0.002),
        ];
        score_batch(&mut batch, &RiskWeights::default()).unwrap();
        // Region a leads the batch on warming, b on rainfall decline.
        assert_eq!(batch[0].dominant_driver, RiskDriver::HeatStress);
        assert_eq!(batch[1].dominant_driver, RiskDriver::Drought);

        // Exact tie on all contributions resolves to the first signal.
        let mut s = summary("t", -0.2, 0.2, -0.2);
        apply_fallback(&mut s, &RiskWeights::default());
        assert_eq!(s.dominant_driver, RiskDriver::Drought);
    }

    #[test]
    fn test_weights_bias_score() {
        let mut batch = vec![
            summary("a", -5.0, 0.01, -0.001),
            summary("b", -1.0, 0.10, -0.003),
        ];
        // Rainfall-only weighting makes region a the clear worst.
        let weights = RiskWeights { rainfall: 1.0, temperature: 0.0, vegetation: 0.0 };
        score_batch(&mut batch, &weights).unwrap();
        assert!((batch[0].risk_score - 1.0).abs() < 1e-12);
        assert!((batch[1].risk_score - 0.0).abs() < 1e-12);
    }
}
