// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::mark_persister::MarkPersister;
use crate::application::mark_store::MarkStore;
use crate::application::sensor_repository::SensorRepository;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub repository: Arc<dyn SensorRepository>,
    /// Server-side copy of the mark map, edited through the text endpoint.
    pub marks: Mutex<MarkStore>,
    pub persister: MarkPersister,
}

impl AppState {
    /// Seeds the mark store from the repository through the chart service.
    pub async fn load(service: &ChartService, repository: Arc<dyn SensorRepository>, persister: MarkPersister) -> Self {
        let session = service.load().await;
        Self {
            repository,
            marks: Mutex::new(session.marks().clone()),
            persister,
        }
    }
}
