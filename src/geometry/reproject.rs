use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::WebMercator;
use crate::error::{Error, Result};
use crate::geojson::{Geometry, SourceCrs};

/// Target of every reprojection: geographic WGS84, lon/lat order.
pub const WGS84_PROJ4: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Converts source coordinates to EPSG:4326 lon/lat degrees.
pub enum ToLonLat {
    Identity,
    WebMercator,
    Proj { from: Proj, to: Proj },
}

impl ToLonLat {
    pub fn for_crs(crs: SourceCrs) -> Result<Self> {
        match crs {
            SourceCrs::Wgs84 => Ok(ToLonLat::Identity),
            SourceCrs::WebMercator => Ok(ToLonLat::WebMercator),
            SourceCrs::Epsg(code) => {
                let from = Proj::from_epsg_code(code)
                    .map_err(|e| Error::UnsupportedCrs(format!("EPSG:{code} ({e})")))?;
                let to = Proj::from_proj_string(WGS84_PROJ4)
                    .map_err(|e| Error::UnsupportedCrs(format!("EPSG:4326 ({e})")))?;
                Ok(ToLonLat::Proj { from, to })
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, ToLonLat::Identity)
    }

    /// Transform one position. A position the projection cannot invert comes
    /// back as NaN, which geometry validation later rejects.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            ToLonLat::Identity => (x, y),
            ToLonLat::WebMercator => WebMercator.unproject(x, y),
            ToLonLat::Proj { from, to } => {
                // geographic definitions work in radians
                let mut point = if from.is_latlong() {
                    (x.to_radians(), y.to_radians(), 0.0)
                } else {
                    (x, y, 0.0)
                };
                match transform(from, to, &mut point) {
                    Ok(()) => (point.0.to_degrees(), point.1.to_degrees()),
                    Err(_) => (f64::NAN, f64::NAN),
                }
            }
        }
    }

    pub fn reproject(&self, geometry: &mut Geometry) {
        if !self.is_identity() {
            geometry.map_positions(|x, y| self.apply(x, y));
        }
    }
}
