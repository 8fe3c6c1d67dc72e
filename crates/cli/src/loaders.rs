//! File-based loaders for the CLI
//!
//! A study manifest is a single JSON file naming the regions, climate
//! records and satellite scenes of one run; band data lives in
//! single-band GeoTIFF files referenced by relative path. These loaders
//! turn that layout into the pipeline's in-memory types, so the
//! analysis crates never touch the filesystem.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agroclim_analysis::loader::{ClimateSeriesLoader, RasterBandLoader, SceneCache, SceneKey};
use agroclim_core::{
    reference_regions, BandGrid, ClimateSample, DateRange, Error, RasterObservation, Region,
    RegionId, Result,
};
use chrono::NaiveDate;
use ndarray::Array2;
use serde::Deserialize;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype::Gray64Float, TiffEncoder};
use tracing::debug;

/// One satellite scene: the band files for a region on one date.
///
/// Paths are resolved relative to the manifest's directory. `scale`
/// converts stored values to reflectance; Sentinel-2 L2A products store
/// reflectance as integers scaled by 10000, so their scenes set 1e-4.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneRecord {
    pub region: RegionId,
    pub date: NaiveDate,
    pub red: PathBuf,
    pub nir: PathBuf,
    pub swir: PathBuf,
    /// Optional cloud mask raster; nonzero pixels are cloudy.
    #[serde(default)]
    pub mask: Option<PathBuf>,
    /// Scene-level cloud fraction, used when no mask file exists.
    #[serde(default)]
    pub cloud_fraction: Option<f64>,
    /// Multiplier from stored values to reflectance.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// A study manifest: everything one `assess` run needs.
#[derive(Debug, Deserialize)]
pub struct StudyManifest {
    /// Regions under assessment. Empty means the built-in catalogue.
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub climate: Vec<ClimateSample>,
    #[serde(default)]
    pub scenes: Vec<SceneRecord>,
}

impl StudyManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Other(format!("{}: {}", path.display(), e)))
    }

    /// The manifest's regions, or the reference catalogue when it
    /// names none.
    pub fn study_regions(&self) -> Vec<Region> {
        if self.regions.is_empty() {
            reference_regions()
        } else {
            self.regions.clone()
        }
    }
}

/// Loads observations from single-band GeoTIFFs listed in a manifest.
///
/// Assembled scenes go through an explicit [`SceneCache`], so repeated
/// queries over overlapping date ranges reread nothing from disk until
/// the least recently used scene is evicted.
pub struct GeoTiffBandLoader {
    base: PathBuf,
    scenes: Vec<SceneRecord>,
    cache: SceneCache,
}

impl GeoTiffBandLoader {
    /// `base` anchors the relative paths in `scenes`; `cache_scenes`
    /// bounds the number of assembled observations kept in memory.
    pub fn new(base: impl Into<PathBuf>, scenes: Vec<SceneRecord>, cache_scenes: usize) -> Self {
        GeoTiffBandLoader {
            base: base.into(),
            scenes,
            cache: SceneCache::new(cache_scenes),
        }
    }

    /// Number of scene records the loader knows about.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    fn assemble(&self, scene: &SceneRecord) -> Result<RasterObservation> {
        let red = read_band(&self.resolve(&scene.red), scene.scale)?;
        let nir = read_band(&self.resolve(&scene.nir), scene.scale)?;
        let swir = read_band(&self.resolve(&scene.swir), scene.scale)?;
        let mut obs = RasterObservation::new(scene.region.clone(), scene.date, red, nir, swir)?;
        if let Some(mask_path) = &scene.mask {
            obs = obs.with_cloud_mask(read_mask(&self.resolve(mask_path))?)?;
        } else if let Some(fraction) = scene.cloud_fraction {
            obs = obs.with_cloud_fraction(fraction)?;
        }
        Ok(obs)
    }
}

impl RasterBandLoader for GeoTiffBandLoader {
    fn load_observations(
        &mut self,
        region: &RegionId,
        range: DateRange,
    ) -> Result<Vec<RasterObservation>> {
        let selected: Vec<usize> = self
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.region == *region && range.contains(s.date))
            .map(|(i, _)| i)
            .collect();

        let mut observations = Vec::with_capacity(selected.len());
        for i in selected {
            let scene = self.scenes[i].clone();
            let key = SceneKey::new(scene.region.clone(), scene.date);
            if let Some(hit) = self.cache.get(&key) {
                debug!(region = %key.region, date = %key.date, "scene cache hit");
                observations.push((*hit).clone());
                continue;
            }
            let obs = self.assemble(&scene)?;
            self.cache.insert(key, Arc::new(obs.clone()));
            observations.push(obs);
        }
        Ok(observations)
    }
}

/// Climate samples held in memory, filtered per query.
///
/// Backed by the manifest's `climate` array or a standalone JSON file
/// containing an array of samples.
pub struct JsonClimateLoader {
    samples: Vec<ClimateSample>,
}

impl JsonClimateLoader {
    pub fn new(samples: Vec<ClimateSample>) -> Self {
        JsonClimateLoader { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl ClimateSeriesLoader for JsonClimateLoader {
    fn load_climate(&mut self, region: &RegionId, range: DateRange) -> Result<Vec<ClimateSample>> {
        Ok(self
            .samples
            .iter()
            .filter(|s| s.region == *region && range.contains(s.date))
            .cloned()
            .collect())
    }
}

/// Read a single-band GeoTIFF into a band grid.
///
/// Accepts the common grayscale sample formats; integer samples are
/// converted to reflectance through `scale`.
pub fn read_band(path: &Path, scale: f64) -> Result<BandGrid> {
    let file = File::open(path)?;
    decode_band(BufReader::new(file), scale).map_err(|e| match e {
        Error::Other(msg) => Error::Other(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

fn decode_band<R: Read + Seek>(reader: R, scale: f64) -> Result<BandGrid> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("cannot read dimensions: {}", e)))?;
    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("cannot read image data: {}", e)))?;

    let values: Vec<f64> = match result {
        DecodingResult::F32(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v * scale).collect(),
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f64 * scale).collect(),
        _ => return Err(Error::Other("unsupported TIFF sample format".to_string())),
    };

    BandGrid::from_vec(height as usize, width as usize, values)
}

/// Read a cloud mask raster; any value above 0.5 marks a pixel cloudy.
pub fn read_mask(path: &Path) -> Result<Array2<bool>> {
    let band = read_band(path, 1.0)?;
    Ok(band.data().mapv(|v| v > 0.5))
}

/// Write a float grid as a single-band GeoTIFF with 64-bit samples.
///
/// `NaN` pixels are written as-is, so excluded pixels survive a
/// round trip through [`read_band`].
pub fn write_band(path: &Path, grid: &Array2<f64>) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))
        .map_err(|e| Error::Other(format!("{}: {}", path.display(), e)))?;
    let values: Vec<f64> = grid.iter().copied().collect();
    encoder
        .write_image::<Gray64Float>(grid.ncols() as u32, grid.nrows() as u32, &values)
        .map_err(|e| Error::Other(format!("{}: {}", path.display(), e)))?;
    Ok(())
}
