//! Clients for the two external collaborators: the open-data source that
//! supplies footprints, and the reverse geocoder that names them.

pub mod nominatim;
pub mod socrata;

use geo::Point;

use crate::domain::BoundingBox;
use crate::error::Result;
use crate::geojson::RawFeatureCollection;

pub use nominatim::NominatimClient;
pub use socrata::SocrataClient;

/// Supplies building footprints inside a bounding box.
pub trait BuildingSource {
    fn fetch(&self, bbox: &BoundingBox, limit: u32) -> Result<RawFeatureCollection>;
}

/// Point to address lookup.
///
/// `Ok(None)` means the service had no address for the point, which callers
/// must keep distinct from `Err`.
pub trait ReverseGeocoder: Sync {
    fn reverse(&self, point: Point<f64>) -> Result<Option<String>>;
}
