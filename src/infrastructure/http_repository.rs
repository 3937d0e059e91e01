// HTTP repository - proxies the sensor device's data and marks endpoints
use crate::application::sensor_repository::{SampleFeed, SensorRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: reqwest::Client,
    samples_url: String,
    marks_url: String,
}

impl HttpRepository {
    pub fn new(samples_url: String, marks_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            samples_url,
            marks_url,
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/octet-stream")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("GET {} failed with status {}", url, status);
        }

        response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

#[async_trait]
impl SensorRepository for HttpRepository {
    async fn fetch_samples(&self) -> Result<SampleFeed> {
        let bytes = self.get_bytes(&self.samples_url).await?;
        let fetched_at_ms = chrono::Utc::now().timestamp_millis();
        tracing::debug!("Fetched {}B of samples from {}", bytes.len(), self.samples_url);
        Ok(SampleFeed {
            bytes,
            fetched_at_ms,
        })
    }

    async fn fetch_marks(&self) -> Result<Bytes> {
        self.get_bytes(&self.marks_url).await
    }

    async fn store_marks(&self, payload: Bytes) -> Result<()> {
        let size = payload.len();
        let response = self
            .client
            .put(&self.marks_url)
            .header("Content-Type", "application/octet-stream")
            .body(payload)
            .send()
            .await
            .context("Failed to send marks to device")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("PUT {} failed with status {}: {}", self.marks_url, status, body);
        }

        tracing::debug!("Stored {}B of marks on device", size);
        Ok(())
    }
}
