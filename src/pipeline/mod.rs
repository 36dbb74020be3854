//! Fetch, enrich and persist building footprints.
//!
//! Steps run in order: query the source, normalize, compute heights, compute
//! centroids, reverse geocode, write the cache file. Only the source query
//! and the cache write can fail a run; everything per-feature degrades to
//! `null`, `"Unknown"` or `"Error"`.

pub mod geocode;
pub mod height;
pub mod normalize;

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

use crate::api::{BuildingSource, ReverseGeocoder};
use crate::cache;
use crate::config::FileConfig;
use crate::domain::{AddressLookup, BoundingBox, BuildingFeature};
use crate::error::Result;
use crate::geojson::FeatureCollection;
use crate::geometry::{Bounds, projected_centroid};

pub use geocode::{GeocodeOptions, resolve_addresses};
pub use height::{apply_heights, compute_height};
pub use normalize::{normalize, rename_fields};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub bbox: BoundingBox,
    pub limit: u32,
    pub output: PathBuf,
    pub geocode: GeocodeOptions,
}

impl RunOptions {
    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            bbox: config.source.bbox,
            limit: config.source.limit,
            output: config.cache.resolved_path(),
            geocode: GeocodeOptions::from(&config.geocoder),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressStats {
    pub resolved: usize,
    pub unknown: usize,
    pub errors: usize,
}

impl AddressStats {
    fn record(&mut self, lookup: &AddressLookup) {
        match lookup {
            AddressLookup::Resolved(_) => self.resolved += 1,
            AddressLookup::Unknown => self.unknown += 1,
            AddressLookup::Error => self.errors += 1,
        }
    }
}

/// Progress reported by [`run`] as each step starts or finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Fetching,
    Fetched {
        features: usize,
        bounds: Option<Bounds>,
    },
    Enriched {
        null_heights: usize,
    },
    Geocoding {
        total: usize,
    },
    Geocoded(AddressStats),
    Writing,
    Written {
        features: usize,
    },
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub features: usize,
    pub null_heights: usize,
    pub addresses: AddressStats,
    pub bounds: Option<Bounds>,
    pub output: PathBuf,
}

/// Query the source for `bbox` and normalize the answer.
pub fn fetch_buildings(
    source: &dyn BuildingSource,
    bbox: &BoundingBox,
    limit: u32,
) -> Result<Vec<BuildingFeature>> {
    bbox.validate()?;

    let raw = source.fetch(bbox, limit)?;
    let received = raw.features.len();
    let buildings = normalize(raw, limit);

    tracing::info!(
        "Total features fetched after SoQL filtering: {} ({} usable)",
        received,
        buildings.len()
    );

    Ok(buildings)
}

pub fn dataset_bounds(buildings: &[BuildingFeature]) -> Option<Bounds> {
    Bounds::from_geometries(buildings.iter().map(|b| &b.footprint))
}

pub fn compute_centroids(buildings: &mut [BuildingFeature]) {
    for building in buildings.iter_mut() {
        building.centroid = projected_centroid(&building.footprint);
    }
}

/// Reverse geocode every centroid and store the result on its building.
pub fn geocode_buildings(
    buildings: &mut [BuildingFeature],
    geocoder: &dyn ReverseGeocoder,
    options: &GeocodeOptions,
    progress: &ProgressBar,
) -> AddressStats {
    let points: Vec<_> = buildings.iter().map(|b| b.centroid).collect();
    let lookups = resolve_addresses(geocoder, &points, options, progress);

    let mut stats = AddressStats::default();
    for (building, lookup) in buildings.iter_mut().zip(lookups) {
        stats.record(&lookup);
        building.address = lookup;
    }
    stats
}

/// Write buildings to the cache file, dropping everything computed only for
/// enrichment.
pub fn persist(buildings: Vec<BuildingFeature>, path: &Path) -> Result<()> {
    let features = buildings
        .into_iter()
        .map(BuildingFeature::into_feature)
        .collect();
    cache::write_collection(path, &FeatureCollection::new(features))?;
    Ok(())
}

/// One complete, non-resumable run.
///
/// `on_stage` is called at every step boundary; `progress` advances once per
/// geocoded building.
pub fn run(
    source: &dyn BuildingSource,
    geocoder: &dyn ReverseGeocoder,
    options: &RunOptions,
    progress: &ProgressBar,
    mut on_stage: impl FnMut(Stage),
) -> Result<RunSummary> {
    on_stage(Stage::Fetching);
    let mut buildings = fetch_buildings(source, &options.bbox, options.limit)?;
    let bounds = dataset_bounds(&buildings);
    on_stage(Stage::Fetched {
        features: buildings.len(),
        bounds: bounds.clone(),
    });

    let null_heights = apply_heights(&mut buildings);
    compute_centroids(&mut buildings);
    on_stage(Stage::Enriched { null_heights });

    progress.set_length(buildings.len() as u64);
    on_stage(Stage::Geocoding {
        total: buildings.len(),
    });
    let addresses = geocode_buildings(&mut buildings, geocoder, &options.geocode, progress);
    on_stage(Stage::Geocoded(addresses));

    let features = buildings.len();
    on_stage(Stage::Writing);
    persist(buildings, &options.output)?;
    tracing::debug!(
        "Saved {} filtered buildings to {}",
        features,
        options.output.display()
    );
    on_stage(Stage::Written { features });

    Ok(RunSummary {
        features,
        null_heights,
        addresses,
        bounds,
        output: options.output.clone(),
    })
}
