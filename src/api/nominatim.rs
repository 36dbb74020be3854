use geo::Point;
use serde::Deserialize;
use std::time::Duration;

use crate::api::ReverseGeocoder;
use crate::config::GeocoderConfig;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct ReverseResult {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ReverseResult {
    fn into_address(self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        self.display_name.filter(|name| !name.trim().is_empty())
    }
}

/// Reverse geocoding through a Nominatim instance.
///
/// Nominatim answers "nothing here" with a 200 and an `error` body, which maps
/// to `Ok(None)`. Transport failures, timeouts and error statuses map to
/// `Err`.
pub struct NominatimClient {
    reverse_url: String,
    client: reqwest::blocking::Client,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("failed to create geocoding client: {e}")))?;

        Ok(Self {
            reverse_url: format!("{}/reverse", config.url.trim_end_matches('/')),
            client,
        })
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, point: Point<f64>) -> Result<Option<String>> {
        let (lon, lat) = (point.x(), point.y());
        let failed = |message: String| Error::Geocode { lat, lon, message };

        let response = self
            .client
            .get(&self.reverse_url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .send()
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("status {}", response.status())));
        }

        let result: ReverseResult = response
            .json()
            .map_err(|e| failed(format!("unreadable response: {e}")))?;

        Ok(result.into_address())
    }
}
