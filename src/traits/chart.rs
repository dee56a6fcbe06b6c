use async_trait::async_trait;
use serde_json::Value;

/// Ephemeris/chart provider — returns raw natal or transit chart payloads
/// for a datetime + coordinates pair. Payloads are provider-shaped JSON;
/// the engine does all interpretation.
#[async_trait]
pub trait ChartProvider: Send + Sync {
    async fn natal_planet_position(
        &self,
        datetime: &str,
        coordinates: &str,
    ) -> anyhow::Result<Value>;

    async fn transit_planet_position(
        &self,
        birth_datetime: &str,
        birth_coordinates: &str,
        transit_datetime: &str,
        current_coordinates: &str,
    ) -> anyhow::Result<Value>;
}

/// City name → `"lat,lng"` lookup. Consumed only by the caller layer to
/// fill in coordinates when a city name is given instead; the engine and
/// agent always receive coordinates.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn coordinates(&self, city: &str) -> anyhow::Result<String>;
}
