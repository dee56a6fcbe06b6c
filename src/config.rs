use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub geo: GeoConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_provider_base_url(),
            model: default_model(),
        }
    }
}

fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_chart_base_url")]
    pub base_url: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: default_chart_base_url(),
        }
    }
}

fn default_chart_base_url() -> String {
    "https://api.prokerala.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoConfig {
    #[serde(default = "default_geo_base_url")]
    pub base_url: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: default_geo_base_url(),
        }
    }
}

fn default_geo_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_ai_retries")]
    pub ai_retries: u32,
    #[serde(default = "default_transit_top_k")]
    pub transit_top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_retries: default_ai_retries(),
            transit_top_k: default_transit_top_k(),
        }
    }
}

fn default_ai_retries() -> u32 {
    3
}

fn default_transit_top_k() -> usize {
    3
}

impl AppConfig {
    /// Load `config.toml` if present, then fill in secrets from the
    /// environment when the file left them empty.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: AppConfig = if path.exists() {
            toml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            AppConfig::default()
        };

        if config.provider.api_key.is_empty() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                config.provider.api_key = key;
            }
        }
        if config.chart.client_id.is_empty() {
            if let Ok(id) = std::env::var("PROKERALA_CLIENT_ID") {
                config.chart.client_id = id;
            }
        }
        if config.chart.client_secret.is_empty() {
            if let Ok(secret) = std::env::var("PROKERALA_CLIENT_SECRET") {
                config.chart.client_secret = secret;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine.ai_retries, 3);
        assert_eq!(config.engine.transit_top_k, 3);
        assert!(config.provider.base_url.starts_with("https://"));
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let config: AppConfig = toml::from_str(
            "[provider]\napi_key = \"k\"\n\n[engine]\nai_retries = 5\n",
        )
        .unwrap();
        assert_eq!(config.provider.api_key, "k");
        assert_eq!(config.provider.model, default_model());
        assert_eq!(config.engine.ai_retries, 5);
        assert_eq!(config.engine.transit_top_k, 3);
    }
}
