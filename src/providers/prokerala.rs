//! Chart provider backed by the Prokerala astrology API: OAuth2
//! client-credentials token flow plus the natal and transit
//! planet-position endpoints. Payloads are returned raw; the engine does
//! all interpretation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use zeroize::Zeroize;

use crate::providers::ProviderError;
use crate::traits::ChartProvider;

/// Renew the token this long before its reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct ProkeralaChartProvider {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<CachedToken>>,
}

impl Drop for ProkeralaChartProvider {
    fn drop(&mut self) {
        self.client_secret.zeroize();
    }
}

impl ProkeralaChartProvider {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        info!("Requesting chart API access token");
        let resp = self
            .client
            .post(format!("{}/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, "Token request failed: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), &text).into());
        }

        let data: Value = serde_json::from_str(&text)?;
        let access_token = data["access_token"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("No access_token in token response"))?
            .to_string();
        let expires_in = data["expires_in"].as_u64().unwrap_or(3600);

        let expires_at = Instant::now() + Duration::from_secs(expires_in)
            - TOKEN_EXPIRY_MARGIN.min(Duration::from_secs(expires_in));
        *self.token.write().await = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<Value> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Fetching chart data");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, path, "Chart API error: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), &text).into());
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ChartProvider for ProkeralaChartProvider {
    async fn natal_planet_position(
        &self,
        datetime: &str,
        coordinates: &str,
    ) -> anyhow::Result<Value> {
        self.get(
            "v2/astrology/natal-planet-position",
            &[
                ("datetime", datetime),
                ("coordinates", coordinates),
                ("house_system", "placidus"),
                ("la", "en"),
            ],
        )
        .await
    }

    async fn transit_planet_position(
        &self,
        birth_datetime: &str,
        birth_coordinates: &str,
        transit_datetime: &str,
        current_coordinates: &str,
    ) -> anyhow::Result<Value> {
        self.get(
            "v2/astrology/transit-planet-position",
            &[
                ("birth_datetime", birth_datetime),
                ("birth_coordinates", birth_coordinates),
                ("transit_datetime", transit_datetime),
                ("current_coordinates", current_coordinates),
                ("la", "en"),
            ],
        )
        .await
    }
}
