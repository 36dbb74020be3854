use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::domain::{BuildingFeature, fields};
use crate::geojson::{Geometry, RawFeature, RawFeatureCollection, SourceCrs};
use crate::geometry::ToLonLat;

/// Source attribute names and the canonical names they are stored under
pub const FIELD_RENAMES: [(&str, &str); 4] = [
    ("struct_id", fields::ID),
    ("grd_elev_min_z", fields::GROUND_MIN_Z),
    ("grd_elev_max_z", fields::GROUND_MAX_Z),
    ("rooftop_elev_z", fields::BUILDING_TOP_Z),
];

/// Rename source attributes to their canonical names.
///
/// A canonical key that is already present is left alone, so applying the
/// renames a second time changes nothing.
pub fn rename_fields(properties: &mut Map<String, Value>) {
    for (from, to) in FIELD_RENAMES {
        if properties.contains_key(to) {
            continue;
        }
        if let Some(value) = properties.remove(from) {
            properties.insert(to.to_string(), value);
        }
    }
}

/// Turn the raw source collection into lon/lat buildings.
///
/// Features without a usable polygonal geometry and features repeating an
/// earlier id are dropped. At most `limit` buildings are returned. A declared
/// CRS that cannot be reprojected leaves no feature placeable, so every
/// feature is dropped.
pub fn normalize(raw: RawFeatureCollection, limit: u32) -> Vec<BuildingFeature> {
    let to_lon_lat = match SourceCrs::resolve(raw.crs.as_ref()).and_then(ToLonLat::for_crs) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("{}; dropping all {} features", e, raw.features.len());
            return Vec::new();
        }
    };
    if !to_lon_lat.is_identity() {
        tracing::info!(crs = ?raw.crs, "reprojecting source features to EPSG:4326");
    }

    let mut seen_ids = HashSet::new();
    let mut buildings = Vec::with_capacity(raw.features.len());

    for (index, feature) in raw.features.into_iter().enumerate() {
        if buildings.len() >= limit as usize {
            tracing::warn!(
                "Source returned more than {} features, ignoring the rest",
                limit
            );
            break;
        }

        let Some(building) = normalize_feature(feature, &to_lon_lat) else {
            tracing::warn!(index, "Skipping feature without a valid polygon geometry");
            continue;
        };

        if let Some(id) = building.id.as_ref()
            && !seen_ids.insert(id.to_string())
        {
            tracing::warn!(%id, "Skipping feature with duplicate id");
            continue;
        }

        buildings.push(building);
    }

    buildings
}

fn normalize_feature(feature: RawFeature, to_lon_lat: &ToLonLat) -> Option<BuildingFeature> {
    let mut properties = feature.properties.unwrap_or_default();
    rename_fields(&mut properties);

    let id = properties
        .remove(fields::ID)
        .filter(|v| !v.is_null())
        .or(feature.id);

    let mut geometry: Geometry = serde_json::from_value(feature.geometry?).ok()?;
    to_lon_lat.reproject(&mut geometry);
    let footprint = geometry.to_geo()?;

    Some(BuildingFeature::new(id, geometry, footprint, properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WebMercator;
    use crate::geometry::reproject::WGS84_PROJ4;
    use proj4rs::proj::Proj;
    use proj4rs::transform::transform;
    use serde_json::json;

    fn raw(value: Value) -> RawFeatureCollection {
        serde_json::from_value(value).unwrap()
    }

    fn polygon() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[-114.066, 51.045], [-114.065, 51.045], [-114.065, 51.046], [-114.066, 51.045]]]
        })
    }

    #[test]
    fn test_rename_fields() {
        let mut properties = Map::new();
        properties.insert("struct_id".into(), json!("77"));
        properties.insert("grd_elev_min_z".into(), json!("1040.1"));
        properties.insert("grd_elev_max_z".into(), json!("1041.9"));
        properties.insert("rooftop_elev_z".into(), json!("1080.0"));
        properties.insert("stage".into(), json!("Complete"));

        rename_fields(&mut properties);

        assert_eq!(properties["id"], "77");
        assert_eq!(properties["ground_min_z"], "1040.1");
        assert_eq!(properties["ground_max_z"], "1041.9");
        assert_eq!(properties["building_top_z"], "1080.0");
        assert_eq!(properties["stage"], "Complete");
        assert!(!properties.contains_key("struct_id"));
    }

    #[test]
    fn test_rename_is_idempotent() {
        let mut properties = Map::new();
        properties.insert("struct_id".into(), json!("77"));
        properties.insert("rooftop_elev_z".into(), json!("1080.0"));

        rename_fields(&mut properties);
        let once = properties.clone();
        rename_fields(&mut properties);

        assert_eq!(properties, once);
    }

    #[test]
    fn test_rename_keeps_existing_canonical() {
        let mut properties = Map::new();
        properties.insert("id".into(), json!("canonical"));
        properties.insert("struct_id".into(), json!("source"));

        rename_fields(&mut properties);

        assert_eq!(properties["id"], "canonical");
        assert_eq!(properties["struct_id"], "source");
    }

    #[test]
    fn test_normalize_extracts_id() {
        let collection = raw(json!({
            "features": [
                {"type": "Feature", "geometry": polygon(), "properties": {"struct_id": "A1", "rooftop_elev_z": "12.5"}}
            ]
        }));

        let buildings = normalize(collection, 1000);
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].id, Some(json!("A1")));
        assert!(!buildings[0].properties.contains_key("id"));
        assert_eq!(buildings[0].properties["building_top_z"], "12.5");
    }

    #[test]
    fn test_normalize_drops_invalid_geometry_and_duplicates() {
        let collection = raw(json!({
            "features": [
                {"geometry": polygon(), "properties": {"struct_id": "A1"}},
                {"geometry": null, "properties": {"struct_id": "A2"}},
                {"geometry": {"type": "Point", "coordinates": [-114.0, 51.0]}, "properties": {"struct_id": "A3"}},
                {"geometry": polygon(), "properties": {"struct_id": "A1"}},
                {"geometry": polygon(), "properties": {"struct_id": "A4"}}
            ]
        }));

        let buildings = normalize(collection, 1000);
        let ids: Vec<_> = buildings.iter().map(|b| b.id.clone().unwrap()).collect();
        assert_eq!(ids, vec![json!("A1"), json!("A4")]);
    }

    #[test]
    fn test_normalize_respects_limit() {
        let features: Vec<_> = (0..5)
            .map(|i| json!({"geometry": polygon(), "properties": {"struct_id": i.to_string()}}))
            .collect();
        let collection = raw(json!({ "features": features }));

        let buildings = normalize(collection, 3);
        assert_eq!(buildings.len(), 3);
    }

    #[test]
    fn test_normalize_reprojects_web_mercator() {
        let (x0, y0) = WebMercator.project(-114.066, 51.045);
        let (x1, y1) = WebMercator.project(-114.065, 51.046);
        let collection = raw(json!({
            "crs": {"type": "name", "properties": {"name": "EPSG:3857"}},
            "features": [{
                "geometry": {"type": "Polygon", "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y0]]]},
                "properties": {"struct_id": "M1"}
            }]
        }));

        let buildings = normalize(collection, 1000);
        let Geometry::Polygon { coordinates } = &buildings[0].geometry else {
            panic!("expected polygon");
        };
        assert!((coordinates[0][0][0] - -114.066).abs() < 1e-9);
        assert!((coordinates[0][2][1] - 51.046).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_reprojects_other_epsg() {
        let utm = Proj::from_epsg_code(32611).unwrap();
        let wgs84 = Proj::from_proj_string(WGS84_PROJ4).unwrap();
        let to_utm = |lon: f64, lat: f64| {
            let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
            transform(&wgs84, &utm, &mut point).unwrap();
            vec![point.0, point.1, 1045.2]
        };
        let collection = raw(json!({
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32611"}},
            "features": [{
                "geometry": {"type": "Polygon", "coordinates": [[
                    to_utm(-114.066, 51.045), to_utm(-114.065, 51.045),
                    to_utm(-114.065, 51.046), to_utm(-114.066, 51.045)
                ]]},
                "properties": {"struct_id": "U1"}
            }]
        }));

        let buildings = normalize(collection, 1000);
        assert_eq!(buildings.len(), 1);
        let Geometry::Polygon { coordinates } = &buildings[0].geometry else {
            panic!("expected polygon");
        };
        assert!((coordinates[0][0][0] - -114.066).abs() < 1e-7);
        assert!((coordinates[0][2][1] - 51.046).abs() < 1e-7);
        assert_eq!(coordinates[0][0][2], 1045.2);
    }

    #[test]
    fn test_normalize_unknown_crs_drops_features_without_failing() {
        let collection = raw(json!({
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:ESRI::54009"}},
            "features": [{"geometry": polygon(), "properties": {"struct_id": "X1"}}]
        }));
        assert!(normalize(collection, 1000).is_empty());
    }
}
