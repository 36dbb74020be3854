//! GeoJSON documents exchanged with the open-data source and the cache file.
//!
//! Only the polygonal subset is modelled. Positions are kept as raw ordinate
//! lists so that elevation ordinates survive a read/write cycle untouched.

pub mod crs;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use crs::{Crs, SourceCrs};

/// `[x, y]` or `[x, y, z]`
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

/// A feature as delivered by the source, before its geometry is validated.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeatureCollection {
    #[serde(default)]
    pub crs: Option<Crs>,
    #[serde(default)]
    pub features: Vec<RawFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: CollectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Crs>,
    pub features: Vec<Feature>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: FeatureType::Feature,
            id: None,
            properties,
            geometry: Some(geometry),
        }
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            crs: None,
            features,
        }
    }
}

impl Geometry {
    /// Convert to a `geo` multipolygon, or `None` if any position has fewer
    /// than two ordinates or no ring is left to describe an area.
    pub fn to_geo(&self) -> Option<MultiPolygon<f64>> {
        let polygons = match self {
            Geometry::Polygon { coordinates } => vec![polygon_from_rings(coordinates)?],
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<Option<Vec<_>>>()?,
        };

        if polygons.is_empty() {
            return None;
        }
        Some(MultiPolygon::new(polygons))
    }

    /// Rewrite every position's x/y in place, leaving further ordinates alone.
    pub fn map_positions(&mut self, f: impl Fn(f64, f64) -> (f64, f64)) {
        let rings: Box<dyn Iterator<Item = &mut Vec<Position>> + '_> = match self {
            Geometry::Polygon { coordinates } => Box::new(coordinates.iter_mut()),
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter_mut().flat_map(|p| p.iter_mut()))
            }
        };

        for ring in rings {
            for position in ring.iter_mut() {
                if position.len() >= 2 {
                    let (x, y) = f(position[0], position[1]);
                    position[0] = x;
                    position[1] = y;
                }
            }
        }
    }
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| ring_to_line_string(ring));
    let exterior = rings.next()??;
    if exterior.0.len() < 3 {
        return None;
    }
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn ring_to_line_string(ring: &[Position]) -> Option<LineString<f64>> {
    ring.iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}
