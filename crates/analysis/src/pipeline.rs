//! Batch assessment pipeline
//!
//! Composes the index calculator, trend engine and risk scorer over a
//! batch of regions. Failures are isolated per region: one region's bad
//! data is recorded and skipped while the rest of the batch completes.
//! With the `parallel` feature regions are processed on a rayon pool;
//! results keep the input order either way, and scoring itself is order
//! invariant, so both modes produce identical output.

use agroclim_core::{
    ClimateSample, Error, RasterObservation, Region, RegionId, RegionalTrendSummary, Result,
    Stage, VegetationIndexSample,
};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::index;
use crate::maybe_rayon::*;
use crate::risk;
use crate::trend;

/// One region's raw inputs: satellite observations plus climate records.
#[derive(Debug, Clone)]
pub struct RegionSeries {
    pub region: Region,
    pub observations: Vec<RasterObservation>,
    pub climate: Vec<ClimateSample>,
}

/// A failure recorded while processing a batch, tied to its region and
/// the stage that produced it.
#[derive(Debug)]
pub struct RegionFailure {
    pub region: RegionId,
    pub stage: Stage,
    pub error: Error,
}

impl RegionFailure {
    fn new(region: RegionId, error: Error, default_stage: Stage) -> Self {
        let stage = error.stage().unwrap_or(default_stage);
        RegionFailure { region, stage, error }
    }
}

/// Outcome of a batch run: summaries in input order for every region
/// that completed, plus every recorded failure.
///
/// A region can appear in `failures` and still have a summary: an
/// unusable observation is recorded but only starves the region out
/// when too few samples remain.
#[derive(Debug, Default)]
pub struct BatchAssessment {
    pub summaries: Vec<RegionalTrendSummary>,
    pub failures: Vec<RegionFailure>,
}

impl BatchAssessment {
    pub fn summary_for(&self, region: &RegionId) -> Option<&RegionalTrendSummary> {
        self.summaries.iter().find(|s| s.region == *region)
    }
}

/// Run the index calculator over a region's observations.
///
/// Returns the samples that aggregated cleanly and the per-observation
/// errors for those that did not.
fn index_region(
    observations: &[RasterObservation],
    config: &PipelineConfig,
) -> (Vec<VegetationIndexSample>, Vec<Error>) {
    let mut samples = Vec::with_capacity(observations.len());
    let mut errors = Vec::new();
    for obs in observations {
        match index::ndvi_sample(obs, &config.index) {
            Ok(sample) => samples.push(sample),
            Err(e) => errors.push(e),
        }
    }
    (samples, errors)
}

/// Assess a single region from raw observations and climate records.
///
/// This is the one-region entry point: observations that fail the
/// valid-pixel rules are logged at warn level and skipped, and the
/// region errors out only if the surviving series is too short. The
/// returned summary carries the flagged fallback risk score; use
/// [`assess_batch`] to score regions relative to each other.
pub fn compute_regional_summary(
    region: &Region,
    observations: &[RasterObservation],
    climate: &[ClimateSample],
    config: &PipelineConfig,
) -> Result<RegionalTrendSummary> {
    config.validate()?;
    let (samples, skipped) = index_region(observations, config);
    for e in &skipped {
        warn!(region = %region.id, error = %e, "skipping unusable observation");
    }
    trend::summarize_trends(region, &samples, climate, config)
}

fn assess_region(
    series: &RegionSeries,
    config: &PipelineConfig,
) -> (Option<RegionalTrendSummary>, Vec<RegionFailure>) {
    let (samples, skipped) = index_region(&series.observations, config);
    let mut failures: Vec<RegionFailure> = skipped
        .into_iter()
        .map(|e| RegionFailure::new(series.region.id.clone(), e, Stage::IndexCalculation))
        .collect();

    match trend::summarize_trends(&series.region, &samples, &series.climate, config) {
        Ok(summary) => (Some(summary), failures),
        Err(e) => {
            failures.push(RegionFailure::new(
                series.region.id.clone(),
                e,
                Stage::TrendAnalysis,
            ));
            (None, failures)
        }
    }
}

/// Assess a whole batch of regions and score them against each other.
///
/// Each region runs independently through indexing and trend fitting;
/// failures are collected, never propagated across regions. Completed
/// summaries are then rescored with batch min-max normalization (two or
/// more summaries) or left on their flagged fallback scores. Summaries
/// come back in input order.
pub fn assess_batch(batch: &[RegionSeries], config: &PipelineConfig) -> Result<BatchAssessment> {
    config.validate()?;

    let results: Vec<(Option<RegionalTrendSummary>, Vec<RegionFailure>)> = batch
        .into_par_iter()
        .map(|series| assess_region(series, config))
        .collect();

    let mut assessment = BatchAssessment::default();
    for (summary, failures) in results {
        if let Some(s) = summary {
            assessment.summaries.push(s);
        }
        assessment.failures.extend(failures);
    }

    risk::score_batch(&mut assessment.summaries, &config.risk_weights)?;

    info!(
        regions = batch.len(),
        summarized = assessment.summaries.len(),
        failures = assessment.failures.len(),
        "batch assessment complete"
    );
    Ok(assessment)
}
