use geo::{Centroid, MultiPolygon, Point};

use super::WebMercator;

/// Centroid of a lon/lat footprint, computed in Web Mercator meters and
/// brought back to lon/lat.
///
/// Returns `None` for geometries without area or vertices.
pub fn projected_centroid(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let projected = WebMercator.project_geometry(geometry);
    let centroid = projected.centroid()?;
    Some(WebMercator.unproject_point(centroid))
}
