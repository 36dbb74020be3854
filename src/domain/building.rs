use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geojson::{Feature, Geometry};

/// Canonical property names written to the cache file
pub mod fields {
    pub const ID: &str = "id";
    pub const GROUND_MIN_Z: &str = "ground_min_z";
    pub const GROUND_MAX_Z: &str = "ground_max_z";
    pub const BUILDING_TOP_Z: &str = "building_top_z";
    pub const HEIGHT: &str = "height";
    pub const ADDRESS: &str = "address";
    pub const STAGE: &str = "stage";
}

/// Outcome of reverse geocoding one centroid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLookup {
    Resolved(String),
    /// The service answered but knew no address for the point
    Unknown,
    /// The lookup itself failed
    Error,
}

impl AddressLookup {
    pub const UNKNOWN: &'static str = "Unknown";
    pub const ERROR: &'static str = "Error";

    /// Blank addresses count as no result.
    pub fn resolved(address: impl Into<String>) -> Self {
        let address = address.into();
        if address.trim().is_empty() {
            AddressLookup::Unknown
        } else {
            AddressLookup::Resolved(address)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AddressLookup::Resolved(address) => address,
            AddressLookup::Unknown => Self::UNKNOWN,
            AddressLookup::Error => Self::ERROR,
        }
    }
}

impl std::fmt::Display for AddressLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One building footprint as it moves through the enrichment pipeline
#[derive(Debug, Clone)]
pub struct BuildingFeature {
    pub id: Option<Value>,
    /// Footprint in lon/lat, exactly as it will be persisted
    pub geometry: Geometry,
    /// The same footprint as `geo` types, for geometric operations
    pub footprint: MultiPolygon<f64>,
    /// Remaining source attributes under their canonical names
    pub properties: Map<String, Value>,
    pub height: Option<f64>,
    /// Only drives the address lookup; never persisted
    pub centroid: Option<Point<f64>>,
    pub address: AddressLookup,
}

impl BuildingFeature {
    pub fn new(
        id: Option<Value>,
        geometry: Geometry,
        footprint: MultiPolygon<f64>,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            geometry,
            footprint,
            properties,
            height: None,
            centroid: None,
            address: AddressLookup::Unknown,
        }
    }

    /// Serialize for the cache file. The centroid is dropped here.
    pub fn into_feature(self) -> Feature {
        let mut properties = self.properties;
        properties.insert(fields::ID.to_string(), self.id.unwrap_or(Value::Null));
        properties.insert(
            fields::HEIGHT.to_string(),
            self.height.map(Value::from).unwrap_or(Value::Null),
        );
        properties.insert(
            fields::ADDRESS.to_string(),
            Value::String(self.address.as_str().to_string()),
        );

        Feature::new(self.geometry, properties)
    }
}

/// The shape served by `GET /api/buildings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub id: Option<Value>,
    pub geometry: Geometry,
    pub height: Option<f64>,
    pub stage: Option<Value>,
    pub address: Option<String>,
}

impl BuildingRecord {
    /// Project a cached feature onto the served fields. `None` when the
    /// feature carries no geometry.
    pub fn from_feature(feature: Feature) -> Option<Self> {
        let Feature {
            id,
            mut properties,
            geometry,
            ..
        } = feature;
        let geometry = geometry?;

        let id = properties
            .remove(fields::ID)
            .filter(|v| !v.is_null())
            .or(id);
        let height = properties.get(fields::HEIGHT).and_then(Value::as_f64);
        let stage = properties.remove(fields::STAGE).filter(|v| !v.is_null());
        let address = properties
            .get(fields::ADDRESS)
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            id,
            geometry,
            height,
            stage,
            address,
        })
    }
}
