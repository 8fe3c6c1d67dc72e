//! # Agroclim Core
//!
//! Core types for the agroclim climate and vegetation risk pipeline.
//!
//! This crate provides:
//! - `BandGrid` / `RasterObservation`: satellite reflectance inputs
//! - `ClimateSample` / `VegetationIndexSample`: per-region time series
//! - `Region` and the built-in South African reference catalogue
//! - `RegionalTrendSummary`: fitted trends and composite risk
//! - `EmissionScenario` / `YieldProjection`: projection inputs and outputs
//! - The shared `Error` taxonomy for all pipeline stages

pub mod band;
pub mod error;
pub mod observation;
pub mod region;
pub mod scenario;
pub mod series;
pub mod summary;

pub use band::BandGrid;
pub use error::{Error, Result, SeriesKind, Stage};
pub use observation::RasterObservation;
pub use region::{reference_regions, Crop, Region, RegionId};
pub use scenario::{CropSensitivity, CropSensitivityTable, EmissionScenario, YieldProjection};
pub use series::{ClimateSample, DateRange, VegetationIndexSample};
pub use summary::{RegionalTrendSummary, RiskDriver, RiskLevel};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::band::BandGrid;
    pub use crate::error::{Error, Result, SeriesKind, Stage};
    pub use crate::observation::RasterObservation;
    pub use crate::region::{reference_regions, Crop, Region, RegionId};
    pub use crate::scenario::{
        CropSensitivity, CropSensitivityTable, EmissionScenario, YieldProjection,
    };
    pub use crate::series::{ClimateSample, DateRange, VegetationIndexSample};
    pub use crate::summary::{RegionalTrendSummary, RiskDriver, RiskLevel};
}
