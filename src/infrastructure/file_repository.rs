// File-backed repository - sample feed and mark buffer kept on local disk
use crate::application::sensor_repository::{SampleFeed, SensorRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileRepository {
    samples_path: PathBuf,
    marks_path: PathBuf,
}

impl FileRepository {
    pub fn new(samples_path: PathBuf, marks_path: PathBuf) -> Self {
        Self {
            samples_path,
            marks_path,
        }
    }
}

#[async_trait]
impl SensorRepository for FileRepository {
    async fn fetch_samples(&self) -> Result<SampleFeed> {
        let bytes = tokio::fs::read(&self.samples_path)
            .await
            .with_context(|| format!("Failed to read samples from {}", self.samples_path.display()))?;
        let fetched_at_ms = chrono::Utc::now().timestamp_millis();
        tracing::debug!("Read {}B of samples from {}", bytes.len(), self.samples_path.display());
        Ok(SampleFeed {
            bytes: Bytes::from(bytes),
            fetched_at_ms,
        })
    }

    async fn fetch_marks(&self) -> Result<Bytes> {
        match tokio::fs::read(&self.marks_path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Bytes::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read marks from {}", self.marks_path.display())),
        }
    }

    async fn store_marks(&self, payload: Bytes) -> Result<()> {
        // Write aside and rename so readers never see a half-written buffer
        let tmp = self.marks_path.with_extension("tmp");
        tokio::fs::write(&tmp, &payload)
            .await
            .with_context(|| format!("Failed to write marks to {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.marks_path)
            .await
            .with_context(|| format!("Failed to replace {}", self.marks_path.display()))?;
        tracing::debug!("Stored {}B of marks", payload.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("aqm-chart-{}-{}", name, nanos));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_marks_file_is_empty() {
        let dir = scratch_dir("missing");
        let repo = FileRepository::new(dir.join("samples.bin"), dir.join("marks.bin"));

        assert!(repo.fetch_marks().await.unwrap().is_empty());
        assert!(repo.fetch_samples().await.is_err());
    }

    #[tokio::test]
    async fn test_store_then_fetch_marks() {
        let dir = scratch_dir("store");
        let repo = FileRepository::new(dir.join("samples.bin"), dir.join("marks.bin"));
        std::fs::write(dir.join("samples.bin"), [0u8; 24]).unwrap();

        repo.store_marks(Bytes::from_static(&[1, 0, 0, 0, 0, 1, b'a', 0]))
            .await
            .unwrap();
        assert_eq!(repo.fetch_marks().await.unwrap().len(), 8);

        let feed = repo.fetch_samples().await.unwrap();
        assert_eq!(feed.bytes.len(), 24);
        assert!(feed.fetched_at_ms > 0);
    }
}
