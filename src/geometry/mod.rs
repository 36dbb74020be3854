pub mod bounds;
pub mod centroid;
pub mod projection;
pub mod reproject;

pub use bounds::Bounds;
pub use centroid::projected_centroid;
pub use projection::WebMercator;
pub use reproject::ToLonLat;
