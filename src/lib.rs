//! buildings3d - fetch municipal 3D building footprints, enrich them with
//! height and address, cache them as GeoJSON and serve them to a map viewer

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod pipeline;
pub mod server;

pub use error::{Error, Result};
