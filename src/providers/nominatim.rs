//! City-name geocoding through the Nominatim search API. Used by the
//! caller layer to turn a city name into the `"lat,lng"` string the chart
//! provider expects; the engine and agent never see city names.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::GeoResolver;

pub struct NominatimResolver {
    client: Client,
    base_url: String,
    cache: RwLock<HashMap<String, String>>,
}

impl NominatimResolver {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            // Nominatim's usage policy requires an identifying user agent.
            .user_agent(concat!("zodiac-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        })
    }
}

/// Pull `"lat,lng"` out of a Nominatim search response.
fn first_coordinates(results: &Value) -> Option<String> {
    let hit = results.as_array()?.first()?;
    let lat = hit["lat"].as_str()?;
    let lon = hit["lon"].as_str()?;
    Some(format!("{},{}", lat, lon))
}

#[async_trait]
impl GeoResolver for NominatimResolver {
    async fn coordinates(&self, city: &str) -> anyhow::Result<String> {
        if let Some(hit) = self.cache.read().await.get(city) {
            debug!(city, "Geocoding cache hit");
            return Ok(hit.clone());
        }

        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;
        let results: Value = resp.json().await?;

        let coordinates = first_coordinates(&results)
            .ok_or_else(|| anyhow::anyhow!("Location not found for city: {}", city))?;
        debug!(city, %coordinates, "Resolved city");

        self.cache
            .write()
            .await
            .insert(city.to_string(), coordinates.clone());
        Ok(coordinates)
    }
}
