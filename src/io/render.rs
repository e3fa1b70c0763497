use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::application::AppError;
use crate::config::Config;
use crate::domain::ReportDataset;

/// Client for the external service that renders report documents and
/// analyses recent activity.
#[derive(Debug, Clone)]
pub struct RendererClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    context: &'a str,
    data: &'a [String],
}

impl RendererClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::UpstreamUnavailable(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.renderer_url.clone(), config.renderer_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a report dataset and return the rendered document bytes.
    pub async fn render_report(&self, dataset: &ReportDataset) -> Result<Vec<u8>, AppError> {
        let body = self.post("generate-report", dataset).await?;
        debug!(bytes = body.len(), "report rendered");
        Ok(body)
    }

    /// Ask the analysis service about a list of activity summaries.
    /// A JSON object reply is passed through, anything else comes back as a string.
    pub async fn analyze(&self, summary: &[String]) -> Result<serde_json::Value, AppError> {
        let request = AnalysisRequest {
            context: "supply_chain_analysis",
            data: summary,
        };
        let body = self.post("analyze", &request).await?;

        Ok(
            match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&body) {
                Ok(object) => serde_json::Value::Object(object),
                Err(_) => serde_json::Value::String(String::from_utf8_lossy(&body).into_owned()),
            },
        )
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "renderer unreachable");
                AppError::UpstreamUnavailable(format!("cannot reach {url}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "renderer returned an error");
            return Err(AppError::UpstreamUnavailable(format!(
                "{url} returned {status}"
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("failed reading response from {url}: {e}"))
        })?;
        Ok(bytes.to_vec())
    }
}
