// Repository trait for sensor feed and mark storage access
use async_trait::async_trait;
use bytes::Bytes;

/// Raw sample feed together with the wall-clock time it was read.
#[derive(Debug, Clone, Default)]
pub struct SampleFeed {
    pub bytes: Bytes,
    /// Epoch milliseconds; record deltas count back from here.
    pub fetched_at_ms: i64,
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    /// Fetch the binary sample feed (latest-first records)
    async fn fetch_samples(&self) -> anyhow::Result<SampleFeed>;

    /// Fetch the stored mark buffer; empty when nothing was saved yet
    async fn fetch_marks(&self) -> anyhow::Result<Bytes>;

    /// Replace the stored mark buffer
    async fn store_marks(&self, payload: Bytes) -> anyhow::Result<()>;
}
