use axum::body::Bytes;
use std::path::Path;

use crate::cache;
use crate::domain::BuildingRecord;
use crate::error::{Error, Result};

/// Everything the read API serves, loaded once at startup and never mutated.
#[derive(Debug)]
pub struct ApiState {
    buildings: Vec<BuildingRecord>,
    body: Bytes,
}

impl ApiState {
    pub fn new(buildings: Vec<BuildingRecord>) -> Result<Self> {
        let body = serde_json::to_vec(&buildings).map_err(|e| Error::MalformedCache {
            path: Default::default(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            buildings,
            body: Bytes::from(body),
        })
    }

    pub fn buildings(&self) -> &[BuildingRecord] {
        &self.buildings
    }

    /// The JSON array served for every request
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

/// Read the cache file and prepare the response body.
///
/// Fails if the file is missing, unreadable, or holds a feature without a
/// geometry. There is no empty fallback.
pub fn load_state(path: &Path) -> Result<ApiState> {
    let collection = cache::read_collection(path)?;

    let buildings = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            BuildingRecord::from_feature(feature).ok_or_else(|| Error::MalformedCache {
                path: path.to_path_buf(),
                reason: format!("feature {index} has no geometry"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ApiState::new(buildings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "Polygon", "coordinates": [[[-114.066, 51.045], [-114.065, 51.045], [-114.065, 51.046], [-114.066, 51.045]]]},
                 "properties": {"id": "42", "height": 31.5, "address": "Unknown", "stage": "Complete"}}
            ]}"#,
        )
        .unwrap();

        let state = load_state(&path).unwrap();
        assert_eq!(state.buildings().len(), 1);
        assert_eq!(state.buildings()[0].height, Some(31.5));

        let body: serde_json::Value = serde_json::from_slice(&state.body()).unwrap();
        assert_eq!(body[0]["id"], "42");
        assert_eq!(body[0]["stage"], "Complete");
    }

    #[test]
    fn test_missing_cache_fails() {
        let dir = tempdir().unwrap();
        let err = load_state(&dir.path().join("buildings.geojson")).unwrap_err();
        assert!(matches!(err, Error::FileIo { .. }));
    }

    #[test]
    fn test_feature_without_geometry_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "geometry": null, "properties": {}}]}"#,
        )
        .unwrap();

        let err = load_state(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedCache { .. }));
    }
}
