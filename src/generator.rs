//! Image generation gateway: one prompt in, one image URL out.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeneratorConfig;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate a single image for `prompt` and return where it can be fetched.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Calls an HTTP image generation provider.
pub struct HttpImageGenerator {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProviderRequest<'a> {
    prompt: &'a str,
    n: u32,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    data: Vec<ProviderImage>,
    #[serde(default)]
    images: Vec<ProviderImage>,
    #[serde(default, alias = "imageUrl", alias = "image_url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderImage {
    #[serde(default, alias = "imageUrl", alias = "image_url")]
    url: Option<String>,
}

impl ProviderResponse {
    /// `data[]` wins over `images[]`, which wins over a top-level url.
    fn first_url(self) -> Option<String> {
        self.data
            .into_iter()
            .chain(self.images)
            .filter_map(|i| i.url)
            .chain(self.url)
            .find(|u| !u.trim().is_empty())
    }
}

impl HttpImageGenerator {
    pub fn new(config: &GeneratorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build image provider http client")?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let body = ProviderRequest {
            prompt,
            n: 1,
            response_format: "url",
            model: self.model.as_deref(),
        };

        let mut req = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        debug!(url = %self.api_url, "sending generation request");
        let response = req.send().await.context("image provider request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "image provider returned an error");
            anyhow::bail!("image provider returned {}: {}", status, text);
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .context("parse image provider response")?;

        parsed
            .first_url()
            .ok_or_else(|| anyhow::anyhow!("image provider returned no image url"))
    }
}
