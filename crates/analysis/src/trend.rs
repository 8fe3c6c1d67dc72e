//! Trend fitting and series correlation
//!
//! Fits ordinary least-squares slopes against time for temperature,
//! rainfall and NDVI, correlates NDVI with rainfall after nearest-date
//! alignment, and assembles the per-region [`RegionalTrendSummary`].
//!
//! Time enters every fit as fractional years derived from whole-day
//! differences to the series' first date. Because only differences are
//! used, shifting every date by the same number of days leaves the
//! fitted slopes bit-identical.

use agroclim_core::{
    ClimateSample, DateRange, Error, Region, RegionalTrendSummary, Result, RiskDriver, SeriesKind,
    VegetationIndexSample,
};
use chrono::NaiveDate;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::risk;

/// Days in a Julian year, the divisor for fractional-year time axes.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Minimum samples per series (and aligned pairs) for a trend fit.
pub const MIN_HISTORY: usize = 3;

/// Convert dates to fractional years since the first date.
///
/// Uses whole-day differences, never absolute epochs, so a constant
/// shift of all dates reproduces the exact same time axis.
pub fn fractional_years(dates: &[NaiveDate]) -> Vec<f64> {
    let Some(&origin) = dates.first() else {
        return Vec::new();
    };
    dates
        .iter()
        .map(|d| d.signed_duration_since(origin).num_days() as f64 / DAYS_PER_YEAR)
        .collect()
}

/// Ordinary least-squares slope of `values` against `times`.
///
/// Centered formulation: `slope = sum(dt * dv) / sum(dt^2)`. Returns
/// `0.0` when fewer than two points are given or all times coincide;
/// callers that consider that an error must check beforehand.
pub fn ols_slope(times: &[f64], values: &[f64]) -> f64 {
    let n = times.len().min(values.len());
    if n < 2 {
        return 0.0;
    }
    let mean_t = times[..n].iter().sum::<f64>() / n as f64;
    let mean_v = values[..n].iter().sum::<f64>() / n as f64;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dt = times[i] - mean_t;
        sxx += dt * dt;
        sxy += dt * (values[i] - mean_v);
    }
    if sxx == 0.0 {
        return 0.0;
    }
    sxy / sxx
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `0.0` for fewer than two points or when either series has
/// zero variance. The accumulation uses only commutative operations on
/// symmetric terms, so `pearson_correlation(a, b)` equals
/// `pearson_correlation(b, a)` bit for bit.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Pair vegetation samples with their nearest climate sample by date.
///
/// Both slices must be sorted by date. Scans monotonically: each
/// vegetation sample takes the closest not-yet-used climate sample
/// within `tolerance_days` (ties resolve to the earlier date), and each
/// climate sample pairs at most once. Unmatched samples on either side
/// are dropped. Returns `(ndvi, rainfall_mm)` pairs in date order.
pub fn align_by_date(
    vegetation: &[VegetationIndexSample],
    climate: &[ClimateSample],
    tolerance_days: i64,
) -> Vec<(f64, f64)> {
    let mut pairs = Vec::new();
    let mut j = 0usize;
    for v in vegetation {
        while j + 1 < climate.len() {
            let cur = climate[j].date.signed_duration_since(v.date).num_days().abs();
            let next = climate[j + 1]
                .date
                .signed_duration_since(v.date)
                .num_days()
                .abs();
            if next < cur {
                j += 1;
            } else {
                break;
            }
        }
        if j < climate.len() {
            let gap = climate[j].date.signed_duration_since(v.date).num_days().abs();
            if gap <= tolerance_days {
                pairs.push((v.ndvi, climate[j].rainfall_mm));
                j += 1;
            }
        }
    }
    pairs
}

fn distinct_dates<T>(sorted: &[T], date_of: impl Fn(&T) -> NaiveDate) -> usize {
    let mut count = 0;
    let mut last: Option<NaiveDate> = None;
    for item in sorted {
        let d = date_of(item);
        if last != Some(d) {
            count += 1;
            last = Some(d);
        }
    }
    count
}

fn check_history(
    region: &Region,
    series: SeriesKind,
    len: usize,
    distinct: usize,
) -> Result<()> {
    if len < MIN_HISTORY {
        return Err(Error::InsufficientHistory {
            region: region.id.clone(),
            series,
            len,
            min: MIN_HISTORY,
        });
    }
    // A series observed on fewer than two distinct dates has no
    // temporal extent to fit a slope against.
    if distinct < 2 {
        return Err(Error::InsufficientHistory {
            region: region.id.clone(),
            series,
            len: distinct,
            min: 2,
        });
    }
    Ok(())
}

/// Fit trends, correlate the series and assemble a region's summary.
///
/// Inputs need not be sorted; they are ordered by date internally.
/// Every sample must belong to `region`. The returned summary carries a
/// fallback risk score (see [`crate::risk`]); batch callers rescale it
/// across regions afterwards.
pub fn summarize_trends(
    region: &Region,
    vegetation: &[VegetationIndexSample],
    climate: &[ClimateSample],
    config: &PipelineConfig,
) -> Result<RegionalTrendSummary> {
    for s in climate.iter().map(|s| &s.region).chain(vegetation.iter().map(|s| &s.region)) {
        if *s != region.id {
            return Err(Error::InvalidParameter {
                name: "series",
                value: s.to_string(),
                reason: format!("sample region does not match '{}'", region.id),
            });
        }
    }

    let mut climate = climate.to_vec();
    climate.sort_by_key(|s| s.date);
    let mut vegetation = vegetation.to_vec();
    vegetation.sort_by_key(|s| s.date);

    check_history(
        region,
        SeriesKind::Climate,
        climate.len(),
        distinct_dates(&climate, |s| s.date),
    )?;
    check_history(
        region,
        SeriesKind::Vegetation,
        vegetation.len(),
        distinct_dates(&vegetation, |s| s.date),
    )?;

    let climate_dates: Vec<NaiveDate> = climate.iter().map(|s| s.date).collect();
    let climate_times = fractional_years(&climate_dates);
    let temps: Vec<f64> = climate.iter().map(|s| s.temperature_c).collect();
    let rains: Vec<f64> = climate.iter().map(|s| s.rainfall_mm).collect();
    let temperature_slope = ols_slope(&climate_times, &temps);
    let rainfall_slope = ols_slope(&climate_times, &rains);

    let veg_dates: Vec<NaiveDate> = vegetation.iter().map(|s| s.date).collect();
    let veg_times = fractional_years(&veg_dates);
    let ndvis: Vec<f64> = vegetation.iter().map(|s| s.ndvi).collect();
    let ndvi_slope = ols_slope(&veg_times, &ndvis);

    let pairs = align_by_date(&vegetation, &climate, config.correlation_tolerance_days);
    let correlation = if pairs.len() >= MIN_HISTORY {
        let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        pearson_correlation(&xs, &ys)
    } else {
        debug!(
            region = %region.id,
            pairs = pairs.len(),
            "too few aligned pairs for correlation, reporting 0"
        );
        0.0
    };

    let n = climate.len() as f64;
    let mean_temperature_c = temps.iter().sum::<f64>() / n;
    let mean_rainfall_mm = rains.iter().sum::<f64>() / n;
    let drought_frequency = climate.iter().filter(|s| s.drought).count() as f64 / n;

    let start = vegetation[0].date.min(climate[0].date);
    let end = vegetation[vegetation.len() - 1]
        .date
        .max(climate[climate.len() - 1].date);

    let mut summary = RegionalTrendSummary {
        region: region.id.clone(),
        span: DateRange::new(start, end)?,
        temperature_slope,
        rainfall_slope,
        ndvi_slope,
        ndvi_rainfall_correlation: correlation,
        correlation_pairs: pairs.len(),
        mean_temperature_c,
        mean_rainfall_mm,
        drought_frequency,
        risk_score: 0.0,
        fallback_normalization: true,
        dominant_driver: RiskDriver::Drought,
    };
    risk::apply_fallback(&mut summary, &config.risk_weights);
    Ok(summary)
}
