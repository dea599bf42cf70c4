//! Weather lookups against api.weatherapi.com.
//!
//! Weather-intent queries bypass document retrieval; the agent fetches live
//! conditions here and hands the raw JSON to the model as context. The API
//! key comes from the environment variable named in the config, never from
//! the config file itself.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::config::WeatherConfig;

const BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Thin client over the weatherapi.com REST endpoints.
pub struct WeatherClient {
    api_key: String,
    timeout: Duration,
}

impl WeatherClient {
    /// Build a client, reading the API key from the configured environment
    /// variable.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api_key_env))?;
        if api_key.is_empty() {
            bail!("{} is set but empty", config.api_key_env);
        }
        Ok(Self {
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Current conditions for a location, as the API's raw JSON.
    pub async fn current(&self, location: &str) -> Result<serde_json::Value> {
        self.fetch(
            &format!("{BASE_URL}/current.json"),
            &[("q", location), ("aqi", "no")],
        )
        .await
    }

    /// Forecast for a location over `days` days, as the API's raw JSON.
    pub async fn forecast(&self, location: &str, days: u8) -> Result<serde_json::Value> {
        let days = days.to_string();
        self.fetch(
            &format!("{BASE_URL}/forecast.json"),
            &[("q", location), ("days", days.as_str())],
        )
        .await
    }

    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let mut query: Vec<(&str, &str)> = vec![("key", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = client
            .get(url)
            .query(&query)
            .send()
            .await
            .context("weather API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("weather API error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("invalid JSON from weather API")
    }
}
