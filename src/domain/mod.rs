pub mod bbox;
pub mod building;

pub use bbox::BoundingBox;
pub use building::{AddressLookup, BuildingFeature, BuildingRecord, fields};
