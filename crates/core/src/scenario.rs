//! Emission scenarios, crop sensitivities and yield projections

use crate::region::{Crop, RegionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named emission scenario expressed as decadal forcing rates.
///
/// Presets approximate the RCP pathways downscaled for southern Africa,
/// where warming runs ahead of the global mean and rainfall declines in
/// most projections (Engelbrecht et al., 2015).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionScenario {
    pub label: String,
    /// Additional warming per decade, degrees Celsius.
    pub temperature_per_decade_c: f64,
    /// Rainfall change per decade, percent of the regional mean.
    pub rainfall_per_decade_pct: f64,
}

impl EmissionScenario {
    pub fn new(
        label: impl Into<String>,
        temperature_per_decade_c: f64,
        rainfall_per_decade_pct: f64,
    ) -> Self {
        EmissionScenario {
            label: label.into(),
            temperature_per_decade_c,
            rainfall_per_decade_pct,
        }
    }

    /// Low emission pathway.
    pub fn rcp26() -> Self {
        EmissionScenario::new("RCP 2.6", 0.15, -1.0)
    }

    /// Intermediate pathway.
    pub fn rcp45() -> Self {
        EmissionScenario::new("RCP 4.5", 0.30, -2.5)
    }

    /// High emission pathway.
    pub fn rcp85() -> Self {
        EmissionScenario::new("RCP 8.5", 0.50, -5.0)
    }
}

/// Yield response coefficients for one crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSensitivity {
    /// Percent yield change per degree Celsius of warming. Negative for
    /// heat-sensitive crops.
    pub temperature_pct_per_c: f64,
    /// Percent yield change per percent rainfall change.
    pub rainfall_pct_per_pct: f64,
}

/// Lookup table from crop to its yield sensitivity.
///
/// The default table carries coefficients for the three catalogue
/// crops, based on published per-degree yield estimates (Zhao et al.,
/// 2017) adjusted for South African growing conditions. Crops outside
/// the table are a hard error at projection time, never a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropSensitivityTable {
    entries: HashMap<Crop, CropSensitivity>,
}

impl CropSensitivityTable {
    /// Table with no entries.
    pub fn empty() -> Self {
        CropSensitivityTable {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, crop: Crop, sensitivity: CropSensitivity) {
        self.entries.insert(crop, sensitivity);
    }

    pub fn get(&self, crop: Crop) -> Option<CropSensitivity> {
        self.entries.get(&crop).copied()
    }

    pub fn contains(&self, crop: Crop) -> bool {
        self.entries.contains_key(&crop)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Crops present in the table, sorted by name for stable output.
    pub fn crops(&self) -> Vec<Crop> {
        let mut crops: Vec<Crop> = self.entries.keys().copied().collect();
        crops.sort_by_key(|c| c.name());
        crops
    }
}

impl Default for CropSensitivityTable {
    fn default() -> Self {
        let mut table = CropSensitivityTable::empty();
        table.insert(
            Crop::Wheat,
            CropSensitivity {
                temperature_pct_per_c: -6.0,
                rainfall_pct_per_pct: 0.40,
            },
        );
        table.insert(
            Crop::Maize,
            CropSensitivity {
                temperature_pct_per_c: -7.4,
                rainfall_pct_per_pct: 0.50,
            },
        );
        table.insert(
            Crop::Sugarcane,
            CropSensitivity {
                temperature_pct_per_c: -5.1,
                rainfall_pct_per_pct: 0.30,
            },
        );
        table
    }
}

/// Projected yield impact for one region, crop and scenario at a target
/// year.
///
/// `yield_change_pct` is clipped to the configured plausibility range;
/// `clipped` records that the raw value fell outside it. The band is a
/// symmetric uncertainty margin that widens with the projection horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldProjection {
    pub region: RegionId,
    pub crop: Crop,
    /// Label of the scenario the projection was run under.
    pub scenario: String,
    pub target_year: i32,
    /// Projected yield change, percent relative to the observed period.
    pub yield_change_pct: f64,
    /// Lower edge of the uncertainty band, percent.
    pub band_low_pct: f64,
    /// Upper edge of the uncertainty band, percent.
    pub band_high_pct: f64,
    /// Projected temperature change at the target year, degrees Celsius.
    pub temperature_delta_c: f64,
    /// Projected rainfall change at the target year, percent.
    pub rainfall_delta_pct: f64,
    /// `true` when the raw value was outside the plausibility range.
    pub clipped: bool,
}
