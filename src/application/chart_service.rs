// Chart service - Use case for loading a chart session
use crate::application::mark_store::MarkStore;
use crate::application::sensor_repository::{SampleFeed, SensorRepository};
use crate::application::session::ChartSession;
use crate::domain::chart::ChartData;
use crate::domain::mark::Palette;
use crate::infrastructure::sample_codec;
use std::sync::Arc;

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn SensorRepository>,
    palette: Palette,
    marks_budget: usize,
}

impl ChartService {
    pub fn new(repository: Arc<dyn SensorRepository>, palette: Palette, marks_budget: usize) -> Self {
        Self {
            repository,
            palette,
            marks_budget,
        }
    }

    /// Fetches samples and marks concurrently and builds the session once
    /// both are in. A failed fetch is logged and treated as empty.
    pub async fn load(&self) -> ChartSession {
        let (samples, marks) = tokio::join!(self.repository.fetch_samples(), self.repository.fetch_marks());

        let feed = samples.unwrap_or_else(|e| {
            tracing::error!("Error fetching samples: {:#}", e);
            SampleFeed::default()
        });
        let marks = match marks {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!("Error fetching marks: {:#}", e);
                None
            }
        };

        let samples = sample_codec::decode(&feed.bytes, feed.fetched_at_ms);
        let chart = ChartData::new(samples);
        tracing::debug!(
            "Loaded {} samples, {} active series",
            chart.samples.len(),
            chart.series.len()
        );

        let store = MarkStore::load(marks, self.palette.clone(), self.marks_budget);
        ChartSession::new(chart, store)
    }
}
