//! Agricultural regions and their crops
//!
//! A [`Region`] is the unit the whole pipeline operates on: a named
//! polygon in geographic coordinates (WGS84 lon/lat) with the crop that
//! dominates its production. [`reference_regions`] provides the built-in
//! South African study catalogue.

use crate::error::{Error, Result};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier for a region.
///
/// Used as a map key and carried on errors, series samples and results
/// so that outputs from a batch run can always be traced back to their
/// region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        RegionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId(s.to_string())
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        RegionId(s)
    }
}

/// Crops grown in the modelled regions.
///
/// Only crops listed in the yield sensitivity table can be projected;
/// requesting any other crop is a hard error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Wheat,
    Maize,
    Sugarcane,
    Sorghum,
    Millet,
}

impl Crop {
    pub fn name(&self) -> &'static str {
        match self {
            Crop::Wheat => "wheat",
            Crop::Maize => "maize",
            Crop::Sugarcane => "sugarcane",
            Crop::Sorghum => "sorghum",
            Crop::Millet => "millet",
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Crop {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wheat" => Ok(Crop::Wheat),
            "maize" => Ok(Crop::Maize),
            "sugarcane" => Ok(Crop::Sugarcane),
            "sorghum" => Ok(Crop::Sorghum),
            "millet" => Ok(Crop::Millet),
            other => Err(Error::InvalidParameter {
                name: "crop",
                value: other.to_string(),
                reason: "expected one of wheat, maize, sugarcane, sorghum, millet".to_string(),
            }),
        }
    }
}

/// An agricultural region: identifier, display name, boundary polygon
/// and primary crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Boundary in WGS84 lon/lat. Axis-aligned boxes are common but any
    /// simple polygon is accepted.
    pub boundary: Polygon<f64>,
    pub primary_crop: Crop,
}

impl Region {
    pub fn new(
        id: impl Into<RegionId>,
        name: impl Into<String>,
        boundary: Polygon<f64>,
        primary_crop: Crop,
    ) -> Self {
        Region {
            id: id.into(),
            name: name.into(),
            boundary,
            primary_crop,
        }
    }

    /// Build a region from an axis-aligned bounding box
    /// `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn from_bbox(
        id: impl Into<RegionId>,
        name: impl Into<String>,
        bbox: (f64, f64, f64, f64),
        primary_crop: Crop,
    ) -> Result<Self> {
        let (min_lon, min_lat, max_lon, max_lat) = bbox;
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(Error::InvalidParameter {
                name: "bbox",
                value: format!("({}, {}, {}, {})", min_lon, min_lat, max_lon, max_lat),
                reason: "min corner must be strictly below max corner".to_string(),
            });
        }
        Ok(Region::new(
            id,
            name,
            bbox_polygon(min_lon, min_lat, max_lon, max_lat),
            primary_crop,
        ))
    }

    /// Bounding box of the boundary as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for c in self.boundary.exterior().coords() {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Centre of the bounding box as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
    }
}

fn bbox_polygon(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon<f64> {
    let exterior = LineString::from(vec![
        Coord { x: min_lon, y: min_lat },
        Coord { x: max_lon, y: min_lat },
        Coord { x: max_lon, y: max_lat },
        Coord { x: min_lon, y: max_lat },
        Coord { x: min_lon, y: min_lat },
    ]);
    Polygon::new(exterior, vec![])
}

/// The built-in South African study catalogue.
///
/// Three regions spanning the country's main rainfall regimes: winter
/// rainfall wheat in the Western Cape, summer rainfall maize in the
/// Free State, and subtropical sugarcane in KwaZulu-Natal.
pub fn reference_regions() -> Vec<Region> {
    // Bounding boxes are deliberately coarse; they delimit satellite
    // scenes, not farm parcels.
    vec![
        Region::new(
            "western-cape-wheat",
            "Western Cape wheat belt",
            bbox_polygon(18.4, -34.2, 20.5, -33.0),
            Crop::Wheat,
        ),
        Region::new(
            "free-state-maize",
            "Free State maize triangle",
            bbox_polygon(26.5, -29.0, 28.5, -27.0),
            Crop::Maize,
        ),
        Region::new(
            "kzn-sugarcane",
            "KwaZulu-Natal sugarcane coast",
            bbox_polygon(30.5, -29.5, 31.5, -28.5),
            Crop::Sugarcane,
        ),
    ]
}
