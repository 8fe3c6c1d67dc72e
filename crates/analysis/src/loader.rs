//! Loader contracts and the scene cache
//!
//! Data acquisition is an external concern. The pipeline consumes
//! observations and climate records through these traits, so fixtures,
//! file readers and remote archives are interchangeable.
//!
//! [`SceneCache`] is the one piece of shared state the crate offers,
//! and it is explicit: an owned object with a documented LRU eviction
//! policy, passed around by the caller. Nothing in the pipeline caches
//! behind the caller's back.

use std::num::NonZeroUsize;
use std::sync::Arc;

use agroclim_core::{ClimateSample, DateRange, RasterObservation, RegionId, Result};
use chrono::NaiveDate;
use lru::LruCache;

/// Source of satellite observations for a region.
pub trait RasterBandLoader {
    /// Load every observation for `region` dated within `range`,
    /// in any order.
    fn load_observations(&mut self, region: &RegionId, range: DateRange)
        -> Result<Vec<RasterObservation>>;
}

/// Source of climate records for a region.
pub trait ClimateSeriesLoader {
    /// Load every climate sample for `region` dated within `range`,
    /// in any order.
    fn load_climate(&mut self, region: &RegionId, range: DateRange) -> Result<Vec<ClimateSample>>;
}

/// Cache key: one scene is one region on one acquisition date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneKey {
    pub region: RegionId,
    pub date: NaiveDate,
}

impl SceneKey {
    pub fn new(region: impl Into<RegionId>, date: NaiveDate) -> Self {
        SceneKey { region: region.into(), date }
    }
}

/// Bounded cache of loaded observations with least-recently-used
/// eviction.
///
/// Observations are held behind `Arc` so a cache hit shares the bands
/// instead of copying them. Both `get` and `insert` refresh recency;
/// once `capacity` scenes are resident, inserting another evicts the
/// least recently touched one.
pub struct SceneCache {
    inner: LruCache<SceneKey, Arc<RasterObservation>>,
}

impl SceneCache {
    /// Cache holding at most `capacity` scenes. Zero is rounded up to
    /// one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        SceneCache { inner: LruCache::new(capacity) }
    }

    pub fn get(&mut self, key: &SceneKey) -> Option<Arc<RasterObservation>> {
        self.inner.get(key).cloned()
    }

    pub fn insert(&mut self, key: SceneKey, observation: Arc<RasterObservation>) {
        self.inner.put(key, observation);
    }

    pub fn contains(&self, key: &SceneKey) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl std::fmt::Debug for SceneCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
