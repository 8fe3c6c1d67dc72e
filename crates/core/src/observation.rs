//! Satellite raster observations
//!
//! One [`RasterObservation`] is a single acquisition over a region:
//! co-registered Red, NIR and SWIR reflectance bands plus an optional
//! per-pixel cloud mask. All bands must share the same shape; the
//! constructor rejects mismatches so downstream index code can iterate
//! without per-pixel bounds checks.

use crate::band::BandGrid;
use crate::error::{Error, Result};
use crate::region::RegionId;
use chrono::NaiveDate;
use ndarray::Array2;

/// A single dated multi-band acquisition over one region.
#[derive(Debug, Clone)]
pub struct RasterObservation {
    region: RegionId,
    date: NaiveDate,
    red: BandGrid,
    nir: BandGrid,
    swir: BandGrid,
    /// `true` marks a cloudy pixel.
    cloud_mask: Option<Array2<bool>>,
    /// Fraction of pixels flagged cloudy, in `[0, 1]`.
    cloud_fraction: f64,
}

fn check_shape(band: &'static str, expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(Error::BandShapeMismatch {
            band,
            er: expected.0,
            ec: expected.1,
            ar: actual.0,
            ac: actual.1,
        });
    }
    Ok(())
}

impl RasterObservation {
    /// Assemble an observation from its three bands.
    ///
    /// The red band establishes the grid shape; `nir` and `swir` must
    /// match it exactly. Starts with no cloud mask and a cloud fraction
    /// of zero.
    pub fn new(
        region: impl Into<RegionId>,
        date: NaiveDate,
        red: BandGrid,
        nir: BandGrid,
        swir: BandGrid,
    ) -> Result<Self> {
        let shape = red.shape();
        check_shape("nir", shape, nir.shape())?;
        check_shape("swir", shape, swir.shape())?;
        Ok(RasterObservation {
            region: region.into(),
            date,
            red,
            nir,
            swir,
            cloud_mask: None,
            cloud_fraction: 0.0,
        })
    }

    /// Attach a per-pixel cloud mask (`true` = cloudy).
    ///
    /// The cloud fraction is derived from the mask, replacing any value
    /// set earlier.
    pub fn with_cloud_mask(mut self, mask: Array2<bool>) -> Result<Self> {
        check_shape("cloud_mask", self.red.shape(), mask.dim())?;
        let cloudy = mask.iter().filter(|&&c| c).count();
        self.cloud_fraction = cloudy as f64 / mask.len() as f64;
        self.cloud_mask = Some(mask);
        Ok(self)
    }

    /// Record a scene-level cloud fraction without a per-pixel mask.
    ///
    /// Useful when the provider reports scene cloudiness but masking was
    /// already applied upstream (cloudy pixels arriving as `NaN`).
    pub fn with_cloud_fraction(mut self, fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) || fraction.is_nan() {
            return Err(Error::InvalidParameter {
                name: "cloud_fraction",
                value: fraction.to_string(),
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        if self.cloud_mask.is_none() {
            self.cloud_fraction = fraction;
        }
        Ok(self)
    }

    pub fn region(&self) -> &RegionId {
        &self.region
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn red(&self) -> &BandGrid {
        &self.red
    }

    pub fn nir(&self) -> &BandGrid {
        &self.nir
    }

    pub fn swir(&self) -> &BandGrid {
        &self.swir
    }

    pub fn cloud_mask(&self) -> Option<&Array2<bool>> {
        self.cloud_mask.as_ref()
    }

    pub fn cloud_fraction(&self) -> f64 {
        self.cloud_fraction
    }

    /// `(rows, cols)` shared by all bands.
    pub fn shape(&self) -> (usize, usize) {
        self.red.shape()
    }

    /// Whether the mask flags `(row, col)` as cloudy. `false` when no
    /// mask is attached or the index is out of bounds.
    #[inline]
    pub fn is_cloudy(&self, row: usize, col: usize) -> bool {
        self.cloud_mask
            .as_ref()
            .and_then(|m| m.get((row, col)))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn band(rows: usize, cols: usize, value: f64) -> BandGrid {
        BandGrid::filled(rows, cols, value).unwrap()
    }

    #[test]
    fn test_new_validates_shapes() {
        let obs = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(4, 4, 0.1),
            band(4, 4, 0.3),
            band(4, 4, 0.2),
        )
        .unwrap();
        assert_eq!(obs.shape(), (4, 4));
        assert_eq!(obs.cloud_fraction(), 0.0);
        assert!(obs.cloud_mask().is_none());

        let err = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(4, 4, 0.1),
            band(4, 5, 0.3),
            band(4, 4, 0.2),
        );
        assert!(matches!(
            err,
            Err(Error::BandShapeMismatch { band: "nir", ec: 4, ac: 5, .. })
        ));
    }

    #[test]
    fn test_cloud_mask_derives_fraction() {
        let mut mask = Array2::from_elem((2, 2), false);
        mask[(0, 0)] = true;
        let obs = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(2, 2, 0.1),
            band(2, 2, 0.3),
            band(2, 2, 0.2),
        )
        .unwrap()
        .with_cloud_mask(mask)
        .unwrap();

        assert!((obs.cloud_fraction() - 0.25).abs() < 1e-12);
        assert!(obs.is_cloudy(0, 0));
        assert!(!obs.is_cloudy(1, 1));
    }

    #[test]
    fn test_cloud_mask_shape_checked() {
        let mask = Array2::from_elem((3, 2), false);
        let err = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(2, 2, 0.1),
            band(2, 2, 0.3),
            band(2, 2, 0.2),
        )
        .unwrap()
        .with_cloud_mask(mask);
        assert!(matches!(
            err,
            Err(Error::BandShapeMismatch { band: "cloud_mask", .. })
        ));
    }

    #[test]
    fn test_cloud_fraction_bounds() {
        let obs = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(2, 2, 0.1),
            band(2, 2, 0.3),
            band(2, 2, 0.2),
        )
        .unwrap();
        assert!(obs.clone().with_cloud_fraction(0.4).is_ok());
        assert!(obs.clone().with_cloud_fraction(1.2).is_err());
        assert!(obs.clone().with_cloud_fraction(-0.1).is_err());
        assert!(obs.with_cloud_fraction(f64::NAN).is_err());
    }

    #[test]
    fn test_mask_takes_precedence_over_fraction() {
        let mut mask = Array2::from_elem((2, 2), false);
        mask[(0, 1)] = true;
        mask[(1, 0)] = true;
        let obs = RasterObservation::new(
            "wc",
            date(2020, 3, 15),
            band(2, 2, 0.1),
            band(2, 2, 0.3),
            band(2, 2, 0.2),
        )
        .unwrap()
        .with_cloud_mask(mask)
        .unwrap()
        .with_cloud_fraction(0.9)
        .unwrap();
        // Derived fraction wins over the scene-level report.
        assert!((obs.cloud_fraction() - 0.5).abs() < 1e-12);
    }
}
