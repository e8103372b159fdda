use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CityExtractor;
use crate::config::EnrichmentConfig;

/// Asks Gemini's `generateContent` endpoint for the first city in a text.
#[derive(Clone)]
pub struct GeminiCityExtractor {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiCityExtractor {
    pub fn new(http: reqwest::Client, config: &EnrichmentConfig) -> Self {
        Self {
            http,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }
}

pub(crate) fn extraction_prompt(text: &str) -> String {
    format!(
        "Extract the first city name mentioned in the following text. \
Return only the city name (e.g., \"Paris\", \"New York\", \"Tokyo\"). \
If no city is mentioned, return exactly \"None\". \
Do not include any additional text or explanation.\n\n\
Text: \"{text}\"\n\n\
City name:"
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenated text of the first candidate, if any.
fn answer_text(resp: GenerateResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Some(text)
}

#[async_trait]
impl CityExtractor for GeminiCityExtractor {
    async fn extract_city(&self, text: &str) -> anyhow::Result<Option<String>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("GEMINI_API_KEY not configured, skipping city detection");
            return Ok(None);
        };

        let prompt = extraction_prompt(text);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&GenerateRequest {
                contents: [Content {
                    parts: [Part { text: &prompt }],
                }],
            })
            .send()
            .await
            .context("gemini request")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("gemini returned {status}: {body}");
        }

        let parsed: GenerateResponse = res.json().await.context("decode gemini response")?;
        let answer = answer_text(parsed);
        debug!(answer = ?answer, "gemini answered");
        Ok(answer)
    }
}
