use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{WeatherData, WeatherProvider};
use crate::config::EnrichmentConfig;

/// weatherapi.com `current.json` client.
#[derive(Clone)]
pub struct WeatherApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(http: reqwest::Client, config: &EnrichmentConfig) -> Self {
        Self {
            http,
            api_key: config.weather_api_key.clone(),
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<Current>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    condition: Option<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: Option<String>,
    icon: Option<String>,
    code: Option<i64>,
}

impl From<Current> for WeatherData {
    fn from(c: Current) -> Self {
        let (condition, icon) = match c.condition {
            Some(cond) => {
                let icon = cond.icon.or_else(|| cond.code.map(|code| code.to_string()));
                (cond.text, icon)
            }
            None => (None, None),
        };
        Self {
            temperature: c.temp_c.or(c.temp_f),
            condition,
            icon,
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current(&self, city: &str) -> anyhow::Result<Option<WeatherData>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("WEATHER_API_KEY not configured, skipping weather fetch");
            return Ok(None);
        };

        let res = self
            .http
            .get(format!("{}/current.json", self.base_url))
            .query(&[("key", key), ("q", city), ("aqi", "no")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("weather request")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("weather api returned {status}: {body}");
        }

        let parsed: CurrentResponse = res.json().await.context("decode weather response")?;
        match parsed.current {
            Some(current) => Ok(Some(current.into())),
            None => {
                warn!(city = %city, "weather api response has no current block");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(v: serde_json::Value) -> CurrentResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn maps_current_block() {
        let resp = parse(serde_json::json!({
            "location": { "name": "Paris", "country": "France" },
            "current": {
                "temp_c": 18.0,
                "temp_f": 64.4,
                "condition": { "text": "Partly cloudy", "icon": "//cdn/116.png", "code": 1003 }
            }
        }));
        let data: WeatherData = resp.current.unwrap().into();
        assert_eq!(data.temperature, Some(18.0));
        assert_eq!(data.condition.as_deref(), Some("Partly cloudy"));
        assert_eq!(data.icon.as_deref(), Some("//cdn/116.png"));
    }

    #[test]
    fn falls_back_to_fahrenheit_and_code() {
        let resp = parse(serde_json::json!({
            "current": { "temp_f": 50.0, "condition": { "text": "Mist", "code": 1030 } }
        }));
        let data: WeatherData = resp.current.unwrap().into();
        assert_eq!(data.temperature, Some(50.0));
        assert_eq!(data.icon.as_deref(), Some("1030"));
    }

    #[test]
    fn missing_current_block_parses_as_none() {
        let resp = parse(serde_json::json!({ "error": { "code": 1006, "message": "No matching location found." } }));
        assert!(resp.current.is_none());
    }

    #[tokio::test]
    async fn missing_key_disables_lookup() {
        let cfg = EnrichmentConfig {
            gemini_api_key: None,
            gemini_model: "m".into(),
            gemini_base_url: "http://127.0.0.1:9".into(),
            weather_api_key: None,
            weather_base_url: "http://127.0.0.1:9".into(),
        };
        let client = WeatherApiClient::new(reqwest::Client::new(), &cfg);
        assert_eq!(client.current("Paris").await.unwrap(), None);
    }
}
