//! API client for the prediction server

use anyhow::{Context, Result};
use maintenance_lib::{predictor::PredictionInput, store::PredictionRecord};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// HTTP client for the `vmms-server` API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Error body returned by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// One line per invalid field, e.g. `model_year: range`
    pub fn field_errors(&self) -> Vec<String> {
        let Some(details) = self.details.as_ref().and_then(|d| d.as_object()) else {
            return Vec::new();
        };
        let mut lines: Vec<String> = details
            .iter()
            .map(|(field, errors)| {
                let reasons: Vec<String> = errors
                    .as_array()
                    .map(|list| {
                        list.iter()
                            .map(|e| {
                                e["message"]
                                    .as_str()
                                    .or_else(|| e["code"].as_str())
                                    .unwrap_or("invalid")
                                    .to_string()
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                format!("{}: {}", field, reasons.join("; "))
            })
            .collect();
        lines.sort();
        lines
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => {
                    let fields = err.field_errors();
                    if fields.is_empty() {
                        anyhow::bail!("API error ({}): {}", status, err.message);
                    }
                    anyhow::bail!(
                        "API error ({}): {}\n  {}",
                        status,
                        err.message,
                        fields.join("\n  ")
                    );
                }
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    /// Submit one prediction request; the server stores and echoes it
    pub async fn predict(&self, input: &PredictionInput) -> Result<PredictionRecord> {
        self.post("api/predict/", input).await
    }

    /// Most recent stored predictions
    pub async fn history(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        self.get(&format!("api/predictions?limit={}", limit)).await
    }
}
