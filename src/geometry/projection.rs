use geo::{Coord, MapCoords, MultiPolygon, Point};

/// WGS84 semi-major axis used by spherical Web Mercator (EPSG:3857)
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Web Mercator latitude cutoff; poles project to infinity.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical Web Mercator projection between EPSG:4326 and EPSG:3857.
///
/// Coordinates follow GeoJSON order: x is longitude, y is latitude.
/// Projected units are meters, which keeps centroid arithmetic locally
/// Euclidean for city-scale footprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Project a lon/lat point to meters
    ///
    /// # Returns
    /// * (x, y) in EPSG:3857 meters
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

        let x = EARTH_RADIUS_M * lon.to_radians();
        let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();

        (x, y)
    }

    /// Inverse of [`WebMercator::project`]
    ///
    /// # Returns
    /// * (lon, lat) in degrees
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();

        (lon, lat)
    }

    pub fn project_geometry(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| {
            let (x, y) = self.project(c.x, c.y);
            Coord { x, y }
        })
    }

    pub fn unproject_point(&self, point: Point<f64>) -> Point<f64> {
        let (lon, lat) = self.unproject(point.x(), point.y());
        Point::new(lon, lat)
    }
}
