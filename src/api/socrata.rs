use std::time::Duration;

use crate::api::BuildingSource;
use crate::config::SourceConfig;
use crate::domain::BoundingBox;
use crate::error::{Error, Result};
use crate::geojson::RawFeatureCollection;

const USER_AGENT: &str = concat!("buildings3d/", env!("CARGO_PKG_VERSION"));

/// Socrata (SODA) GeoJSON endpoint, e.g. the City of Calgary 3D buildings set
pub struct SocrataClient {
    url: String,
    geometry_column: String,
    client: reqwest::blocking::Client,
}

impl SocrataClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: config.url.clone(),
            geometry_column: config.geometry_column.clone(),
            client,
        })
    }

    fn query_params(&self, bbox: &BoundingBox, limit: u32) -> [(&'static str, String); 2] {
        [
            ("$where", bbox.within_box_clause(&self.geometry_column)),
            ("$limit", limit.to_string()),
        ]
    }
}

impl BuildingSource for SocrataClient {
    /// One GET, no retry. Any transport failure or non-success status aborts.
    fn fetch(&self, bbox: &BoundingBox, limit: u32) -> Result<RawFeatureCollection> {
        let params = self.query_params(bbox, limit);
        tracing::debug!(url = %self.url, filter = %params[0].1, limit, "querying source");

        let response = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .map_err(|e| Error::Network(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "{} returned error status: {status}",
                self.url
            )));
        }

        response
            .json()
            .map_err(|e| Error::Network(format!("failed to parse GeoJSON response: {e}")))
    }
}
