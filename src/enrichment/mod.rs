//! Task text → city → current weather.
//!
//! Both lookups are best-effort: every failure is logged here and collapses
//! into an empty [`Enrichment`], so task writes never fail because of them.

pub mod gemini;
pub mod weather;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Snapshot of current conditions stored with a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Result of the pipeline. `weather` is only ever set alongside `city`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub city: Option<String>,
    pub weather: Option<WeatherData>,
}

#[async_trait]
pub trait CityExtractor: Send + Sync {
    /// Returns the raw model answer for `text`, or `None` when the step is disabled.
    async fn extract_city(&self, text: &str) -> anyhow::Result<Option<String>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> anyhow::Result<Option<WeatherData>>;
}

#[derive(Clone)]
pub struct Enricher {
    cities: Arc<dyn CityExtractor>,
    weather: Arc<dyn WeatherProvider>,
}

impl Enricher {
    pub fn new(cities: Arc<dyn CityExtractor>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { cities, weather }
    }

    #[instrument(skip_all)]
    pub async fn enrich(&self, title: &str, note: Option<&str>) -> Enrichment {
        let text = task_text(title, note);
        if text.is_empty() {
            return Enrichment::default();
        }

        let city = match self.cities.extract_city(&text).await {
            Ok(answer) => answer.as_deref().and_then(normalize_city),
            Err(e) => {
                warn!(error = %e, "city extraction failed");
                None
            }
        };
        let Some(city) = city else {
            debug!("no city in task text");
            return Enrichment::default();
        };

        let weather = match self.weather.current(&city).await {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, city = %city, "weather lookup failed");
                None
            }
        };
        debug!(city = %city, has_weather = weather.is_some(), "task enriched");
        Enrichment {
            city: Some(city),
            weather,
        }
    }
}

pub(crate) fn task_text(title: &str, note: Option<&str>) -> String {
    format!("{} {}", title, note.unwrap_or_default())
        .trim()
        .to_string()
}

/// Cleans a model answer; `None`, blanks and quoted/dotted variants of them mean no city.
pub(crate) fn normalize_city(raw: &str) -> Option<String> {
    let city = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim();
    if city.is_empty() || city.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(city.to_string())
    }
}
