//! Vegetation and moisture index calculation
//!
//! Computes per-pixel spectral indices from a [`RasterObservation`] and
//! aggregates them into one regional sample per acquisition date.
//!
//! NDVI (Rouse et al., 1974):
//! `NDVI = (NIR - Red) / (NIR + Red)`
//!
//! Moisture index (NDMI, Gao, 1996):
//! `NDMI = (NIR - SWIR) / (NIR + SWIR)`
//!
//! A pixel is excluded from both the grid and the aggregate when it is
//! flagged cloudy, either band is `NaN`, either band is negative, or
//! the denominator magnitude falls below `epsilon`. Exclusion is total:
//! a pixel either contributes exactly or not at all, so re-running an
//! observation always reproduces the same sample.

use agroclim_core::{BandGrid, Error, RasterObservation, Result, VegetationIndexSample};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Parameters for index aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// Pixels whose band sum magnitude falls below this are excluded.
    pub epsilon: f64,
    /// Minimum fraction of usable pixels required to accept a scene.
    pub min_valid_fraction: f64,
}

impl Default for IndexParams {
    fn default() -> Self {
        IndexParams {
            epsilon: 1e-6,
            min_valid_fraction: 0.10,
        }
    }
}

impl IndexParams {
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                value: self.epsilon.to_string(),
                reason: "must be finite and positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_valid_fraction) || self.min_valid_fraction.is_nan() {
            return Err(Error::InvalidParameter {
                name: "min_valid_fraction",
                value: self.min_valid_fraction.to_string(),
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

#[inline]
fn usable(a: f64, b: f64, cloudy: bool, epsilon: f64) -> bool {
    !cloudy && !a.is_nan() && !b.is_nan() && a >= 0.0 && b >= 0.0 && (a + b).abs() >= epsilon
}

/// Per-pixel normalized difference `(a - b) / (a + b)` with excluded
/// pixels carrying `NaN`.
fn normalized_difference_grid(
    obs: &RasterObservation,
    a: &BandGrid,
    b: &BandGrid,
    params: &IndexParams,
) -> Array2<f64> {
    let (rows, cols) = obs.shape();
    let mut out = Array2::from_elem((rows, cols), f64::NAN);
    for row in 0..rows {
        for col in 0..cols {
            // SAFETY: all bands share obs.shape(), checked at construction.
            let av = unsafe { a.get_unchecked(row, col) };
            let bv = unsafe { b.get_unchecked(row, col) };
            if usable(av, bv, obs.is_cloudy(row, col), params.epsilon) {
                out[(row, col)] = (av - bv) / (av + bv);
            }
        }
    }
    out
}

/// Mean normalized difference over usable pixels.
///
/// Returns `(mean, valid, total)`; errors when the usable fraction is
/// below `min_valid_fraction` or no pixel is usable at all.
fn normalized_difference_mean(
    obs: &RasterObservation,
    a: &BandGrid,
    b: &BandGrid,
    params: &IndexParams,
) -> Result<(f64, usize, usize)> {
    let (rows, cols) = obs.shape();
    let total = rows * cols;
    let mut sum = 0.0;
    let mut valid = 0usize;
    for row in 0..rows {
        for col in 0..cols {
            // SAFETY: all bands share obs.shape(), checked at construction.
            let av = unsafe { a.get_unchecked(row, col) };
            let bv = unsafe { b.get_unchecked(row, col) };
            if usable(av, bv, obs.is_cloudy(row, col), params.epsilon) {
                sum += (av - bv) / (av + bv);
                valid += 1;
            }
        }
    }
    // Even with a zero threshold an empty aggregate is an error, never NaN.
    if valid == 0 || (valid as f64) < params.min_valid_fraction * total as f64 {
        return Err(Error::InsufficientValidPixels {
            region: obs.region().clone(),
            valid,
            total,
            required_fraction: params.min_valid_fraction,
        });
    }
    // Each term lies in [-1, 1]; clamp guards one-ulp accumulation drift.
    let mean = (sum / valid as f64).clamp(-1.0, 1.0);
    Ok((mean, valid, total))
}

/// Per-pixel NDVI grid for one observation. Excluded pixels are `NaN`.
pub fn ndvi_grid(obs: &RasterObservation, params: &IndexParams) -> Array2<f64> {
    normalized_difference_grid(obs, obs.nir(), obs.red(), params)
}

/// Per-pixel moisture index (NDMI) grid. Excluded pixels are `NaN`.
pub fn moisture_grid(obs: &RasterObservation, params: &IndexParams) -> Array2<f64> {
    normalized_difference_grid(obs, obs.nir(), obs.swir(), params)
}

/// Aggregate one observation into a regional NDVI sample.
///
/// The sample's `coverage` is the usable-pixel fraction. Fails with
/// [`Error::InsufficientValidPixels`] when coverage falls below
/// `params.min_valid_fraction`.
pub fn ndvi_sample(obs: &RasterObservation, params: &IndexParams) -> Result<VegetationIndexSample> {
    let (mean, valid, total) = normalized_difference_mean(obs, obs.nir(), obs.red(), params)?;
    VegetationIndexSample::new(
        obs.region().clone(),
        obs.date(),
        mean,
        valid as f64 / total as f64,
    )
}

/// Mean moisture index (NDMI) over usable pixels of one observation.
///
/// Same masking and coverage rules as [`ndvi_sample`].
pub fn moisture_mean(obs: &RasterObservation, params: &IndexParams) -> Result<f64> {
    let (mean, _, _) = normalized_difference_mean(obs, obs.nir(), obs.swir(), params)?;
    Ok(mean)
}

/// Map a mean NDVI to a 0-100 crop health gauge.
///
/// Linear rescale of `[-1, 1]` onto `[0, 100]`, clamped. Dense healthy
/// canopy (NDVI around 0.7) lands near 85; bare soil (around 0.1) near
/// 55.
pub fn crop_health_index(ndvi: f64) -> f64 {
    ((ndvi + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs_from(red: Vec<f64>, nir: Vec<f64>, swir: Vec<f64>, cols: usize) -> RasterObservation {
        let rows = red.len() / cols;
        RasterObservation::new(
            "test",
            date(2020, 3, 15),
            BandGrid::from_vec(rows, cols, red).unwrap(),
            BandGrid::from_vec(rows, cols, nir).unwrap(),
            BandGrid::from_vec(rows, cols, swir).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_bands_give_expected_ndvi() {
        // Red 0.1 and NIR 0.3 everywhere: NDVI = 0.2 / 0.4 = 0.5.
        let obs = obs_from(vec![0.1; 4], vec![0.3; 4], vec![0.2; 4], 2);
        let sample = ndvi_sample(&obs, &IndexParams::default()).unwrap();
        assert!(
            (sample.ndvi - 0.5).abs() < 1e-10,
            "Expected 0.5, got {}",
            sample.ndvi
        );
        assert!((sample.coverage - 1.0).abs() < 1e-12);
        assert_eq!(sample.date, date(2020, 3, 15));
    }

    #[test]
    fn test_cloudy_pixels_excluded() {
        // Clear pixels read NDVI 0.5, cloudy ones would read ~0.818.
        let obs = RasterObservation::new(
            "test",
            date(2020, 3, 15),
            BandGrid::from_vec(2, 2, vec![0.1, 0.01, 0.1, 0.01]).unwrap(),
            BandGrid::from_vec(2, 2, vec![0.3, 0.1, 0.3, 0.1]).unwrap(),
            BandGrid::from_vec(2, 2, vec![0.2; 4]).unwrap(),
        )
        .unwrap()
        .with_cloud_mask(ndarray::arr2(&[[false, true], [false, true]]))
        .unwrap();

        let sample = ndvi_sample(&obs, &IndexParams::default()).unwrap();
        assert!(
            (sample.ndvi - 0.5).abs() < 1e-10,
            "Expected 0.5, got {}",
            sample.ndvi
        );
        assert!((sample.coverage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_and_negative_reflectance_excluded() {
        let obs = obs_from(
            vec![0.1, f64::NAN, -0.05, 0.1],
            vec![0.3, 0.3, 0.3, 0.3],
            vec![0.2; 4],
            2,
        );
        let sample = ndvi_sample(&obs, &IndexParams::default()).unwrap();
        assert!((sample.coverage - 0.5).abs() < 1e-12);
        assert!((sample.ndvi - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_zero_denominator_excluded() {
        let obs = obs_from(vec![0.0, 0.1], vec![0.0, 0.3], vec![0.0, 0.2], 2);
        let params = IndexParams {
            min_valid_fraction: 0.0,
            ..Default::default()
        };
        let sample = ndvi_sample(&obs, &params).unwrap();
        assert!((sample.coverage - 0.5).abs() < 1e-12);
        assert!((sample.ndvi - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_insufficient_valid_pixels() {
        // One usable pixel out of four is below the 0.5 threshold.
        let obs = obs_from(
            vec![0.1, f64::NAN, f64::NAN, f64::NAN],
            vec![0.3, 0.3, 0.3, 0.3],
            vec![0.2; 4],
            2,
        );
        let params = IndexParams {
            min_valid_fraction: 0.5,
            ..Default::default()
        };
        let err = ndvi_sample(&obs, &params).unwrap_err();
        match err {
            Error::InsufficientValidPixels {
                valid,
                total,
                required_fraction,
                ..
            } => {
                assert_eq!(valid, 1);
                assert_eq!(total, 4);
                assert!((required_fraction - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_coverage_at_exact_threshold_accepted() {
        // Two usable pixels of four sit exactly on the 0.5 cut. The
        // threshold is inclusive; any stricter fraction rejects.
        let obs = obs_from(
            vec![0.1, 0.1, f64::NAN, f64::NAN],
            vec![0.3; 4],
            vec![0.2; 4],
            2,
        );
        let params = IndexParams {
            min_valid_fraction: 0.5,
            ..Default::default()
        };
        let sample = ndvi_sample(&obs, &params).unwrap();
        assert!((sample.coverage - 0.5).abs() < 1e-12);
        assert!((sample.ndvi - 0.5).abs() < 1e-10);

        let stricter = IndexParams {
            min_valid_fraction: 0.51,
            ..Default::default()
        };
        assert!(matches!(
            ndvi_sample(&obs, &stricter),
            Err(Error::InsufficientValidPixels { valid: 2, .. })
        ));
    }

    #[test]
    fn test_no_usable_pixels_errors_even_with_zero_threshold() {
        let obs = obs_from(vec![f64::NAN; 4], vec![0.3; 4], vec![0.2; 4], 2);
        let params = IndexParams {
            min_valid_fraction: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            ndvi_sample(&obs, &params),
            Err(Error::InsufficientValidPixels { valid: 0, .. })
        ));
    }

    #[test]
    fn test_ndvi_grid_marks_excluded_as_nan() {
        let obs = obs_from(
            vec![0.1, f64::NAN, 0.0, 0.1],
            vec![0.3, 0.3, 0.0, 0.2],
            vec![0.2; 4],
            2,
        );
        let grid = ndvi_grid(&obs, &IndexParams::default());
        assert!((grid[(0, 0)] - 0.5).abs() < 1e-10);
        assert!(grid[(0, 1)].is_nan());
        assert!(grid[(1, 0)].is_nan());
        assert!(((grid[(1, 1)]) - (0.1 / 0.3)).abs() < 1e-10);
    }

    #[test]
    fn test_moisture_grid_marks_excluded_as_nan() {
        let obs = obs_from(
            vec![0.1; 4],
            vec![0.5, 0.3, 0.0, 0.3],
            vec![0.3, f64::NAN, 0.0, 0.2],
            2,
        );
        let grid = moisture_grid(&obs, &IndexParams::default());
        assert!((grid[(0, 0)] - 0.25).abs() < 1e-10);
        assert!(grid[(0, 1)].is_nan());
        assert!(grid[(1, 0)].is_nan());
        assert!((grid[(1, 1)] - 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_ndvi_always_in_range() {
        // Gradient bands spanning the usable reflectance range.
        let n = 32usize;
        let red: Vec<f64> = (0..n * n).map(|i| (i % 97) as f64 / 96.0).collect();
        let nir: Vec<f64> = (0..n * n).map(|i| (i % 53) as f64 / 52.0).collect();
        let obs = obs_from(red, nir.clone(), nir, n);
        let grid = ndvi_grid(&obs, &IndexParams::default());
        for v in grid.iter().filter(|v| !v.is_nan()) {
            assert!((-1.0..=1.0).contains(v), "out of range: {}", v);
        }
        let sample = ndvi_sample(&obs, &IndexParams::default()).unwrap();
        assert!((-1.0..=1.0).contains(&sample.ndvi));
    }

    #[test]
    fn test_moisture_mean() {
        // NIR 0.5, SWIR 0.3: NDMI = 0.2 / 0.8 = 0.25.
        let obs = obs_from(vec![0.1; 4], vec![0.5; 4], vec![0.3; 4], 2);
        let m = moisture_mean(&obs, &IndexParams::default()).unwrap();
        assert!((m - 0.25).abs() < 1e-10, "Expected 0.25, got {}", m);
    }

    #[test]
    fn test_crop_health_index_mapping() {
        assert!((crop_health_index(-1.0) - 0.0).abs() < 1e-12);
        assert!((crop_health_index(0.0) - 50.0).abs() < 1e-12);
        assert!((crop_health_index(1.0) - 100.0).abs() < 1e-12);
        assert!((crop_health_index(0.7) - 85.0).abs() < 1e-12);
        // Out-of-range inputs are clamped, not extrapolated.
        assert!((crop_health_index(1.5) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_params_validation() {
        assert!(IndexParams::default().validate().is_ok());
        let bad = IndexParams {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = IndexParams {
            min_valid_fraction: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
