//! # Agroclim Analysis
//!
//! Deterministic climate and vegetation risk analysis for agricultural
//! regions:
//! - `index`: NDVI and moisture index aggregation from satellite bands
//! - `trend`: OLS trend fitting and NDVI-rainfall correlation
//! - `risk`: composite risk scoring across a batch of regions
//! - `projection`: scenario-based yield projection
//! - `pipeline`: batch orchestration with per-region failure isolation
//! - `loader`: acquisition contracts and the LRU scene cache
//!
//! Everything is a pure function of its inputs plus explicit
//! configuration; rerunning any operation on the same data reproduces
//! identical results. Enable the `parallel` feature to spread batch
//! work over a rayon pool without changing any output.

pub mod config;
pub mod index;
pub mod loader;
mod maybe_rayon;
pub mod pipeline;
pub mod projection;
pub mod risk;
pub mod trend;

pub use config::PipelineConfig;
pub use index::{crop_health_index, moisture_grid, moisture_mean, ndvi_grid, ndvi_sample, IndexParams};
pub use loader::{ClimateSeriesLoader, RasterBandLoader, SceneCache, SceneKey};
pub use pipeline::{
    assess_batch, compute_regional_summary, BatchAssessment, RegionFailure, RegionSeries,
};
pub use projection::{project_yield, project_yield_series, ProjectionParams};
pub use risk::{apply_fallback, score_batch, RiskWeights};
pub use trend::{
    align_by_date, fractional_years, ols_slope, pearson_correlation, summarize_trends,
    DAYS_PER_YEAR, MIN_HISTORY,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::index::{ndvi_grid, ndvi_sample, IndexParams};
    pub use crate::loader::{ClimateSeriesLoader, RasterBandLoader, SceneCache, SceneKey};
    pub use crate::pipeline::{
        assess_batch, compute_regional_summary, BatchAssessment, RegionSeries,
    };
    pub use crate::projection::{project_yield, project_yield_series, ProjectionParams};
    pub use crate::risk::{score_batch, RiskWeights};
    pub use crate::trend::summarize_trends;
    pub use agroclim_core::prelude::*;
}
