// HTTP request handlers
use crate::application::mark_store::{CommitStatus, EditOutcome, MarkStore};
use crate::domain::chart::ChartData;
use crate::domain::series::{AxisGroup, SeriesDescriptor};
use crate::infrastructure::csv_export::csv_response;
use crate::infrastructure::http_response::{accepts_brotli, binary_response, OCTET_STREAM};
use crate::infrastructure::sample_codec;
use crate::presentation::app_state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct SeriesView {
    pub series: Vec<SeriesDescriptor>,
    pub axes: Vec<AxisGroup>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    result.unwrap_or_else(|status| status.into_response())
}

/// Raw sample feed, passed through unchanged
pub async fn samples_bin(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.repository.fetch_samples().await {
        Ok(feed) => into_response(binary_response(feed.bytes, OCTET_STREAM, accepts_brotli(&headers)).await),
        Err(e) => {
            tracing::error!("Error fetching samples: {:#}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Decoded samples as fixed-width CSV
pub async fn samples_csv(State(state): State<Arc<AppState>>) -> Response {
    match state.repository.fetch_samples().await {
        Ok(feed) => {
            let samples = sample_codec::decode(&feed.bytes, feed.fetched_at_ms);
            into_response(csv_response(samples, feed.fetched_at_ms))
        }
        Err(e) => {
            tracing::error!("Error fetching samples for CSV: {:#}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Active series and their axis layout for the current feed
pub async fn chart_series(State(state): State<Arc<AppState>>) -> Response {
    match state.repository.fetch_samples().await {
        Ok(feed) => {
            let chart = ChartData::new(sample_codec::decode(&feed.bytes, feed.fetched_at_ms));
            Json(SeriesView {
                series: chart.series,
                axes: chart.axes,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("Error fetching samples for series: {:#}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Stored mark buffer; a lone terminator when nothing was saved
pub async fn get_marks_bin(State(state): State<Arc<AppState>>) -> Response {
    match state.repository.fetch_marks().await {
        Ok(bytes) => {
            let bytes = if bytes.is_empty() { Bytes::from_static(&[0]) } else { bytes };
            into_response(binary_response(bytes, OCTET_STREAM, false).await)
        }
        Err(e) => {
            tracing::error!("Error fetching marks: {:#}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Replaces the stored mark buffer wholesale
pub async fn put_marks_bin(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let mut store = state.marks.lock().await;
    if body.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if body.len() > store.budget() {
        tracing::warn!("Rejected {}B mark upload (limit={}B)", body.len(), store.budget());
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    if let Err(e) = state.repository.store_marks(body.clone()).await {
        tracing::error!("Error storing marks: {:#}", e);
        return StatusCode::BAD_GATEWAY.into_response();
    }
    let reloaded = MarkStore::load(Some(body), store.palette().clone(), store.budget());
    *store = reloaded;
    StatusCode::NO_CONTENT.into_response()
}

/// Text view of the server-side mark map
pub async fn get_marks_txt(State(state): State<Arc<AppState>>) -> Response {
    let text = state.marks.lock().await.text();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
}

/// Applies an edited text view; over-budget edits stay in memory but are
/// not saved
pub async fn put_marks_txt(State(state): State<Arc<AppState>>, body: String) -> Response {
    let mut store = state.marks.lock().await;
    match store.apply_text(&body) {
        EditOutcome::Unchanged => StatusCode::NO_CONTENT.into_response(),
        EditOutcome::Committed(CommitStatus::Ready) => {
            if let Some(payload) = store.persist_payload() {
                state.persister.submit(payload);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        EditOutcome::Committed(CommitStatus::OverBudget { .. }) => {
            let message = store.warning().unwrap_or_default().to_string();
            (StatusCode::PAYLOAD_TOO_LARGE, message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_service::ChartService;
    use crate::application::mark_persister::tests::MemoryRepository;
    use crate::application::mark_persister::{MarkPersister, RetryPolicy};
    use crate::application::sensor_repository::SensorRepository;
    use crate::domain::mark::Palette;
    use crate::infrastructure::sample_codec::{encode, RawSample};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn state(repo: Arc<MemoryRepository>, budget: usize) -> Arc<AppState> {
        let repository: Arc<dyn SensorRepository> = repo;
        let service = ChartService::new(repository.clone(), Palette::default(), budget);
        let persister = MarkPersister::spawn(repository.clone(), RetryPolicy::default());
        Arc::new(AppState::load(&service, repository, persister).await)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn feed() -> Bytes {
        let mut newest = RawSample::empty(0.0);
        newest.pm[0] = 120;
        newest.aux[3] = 4;
        encode(&[newest, RawSample::empty(60_000.0)])
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "ok");
    }

    #[tokio::test]
    async fn test_samples_csv_rows() {
        let repo = Arc::new(MemoryRepository {
            samples: feed(),
            ..Default::default()
        });
        let response = samples_csv(State(state(repo, 512).await)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time_offset, pm10"));
        assert!(lines[1].starts_with("      0.0,  12.0,"));
        assert!(lines[2].starts_with("     60.0,      ,"));
    }

    #[tokio::test]
    async fn test_chart_series_json() {
        let repo = Arc::new(MemoryRepository {
            samples: feed(),
            ..Default::default()
        });
        let response = chart_series(State(state(repo, 512).await)).await;
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();

        let fields: Vec<&str> = json["series"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["pm10", "nox"]);
        assert_eq!(json["axes"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_marks_bin_defaults_to_terminator() {
        let repo = Arc::new(MemoryRepository::default());
        let response = get_marks_bin(State(state(repo, 512).await)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "\0");
    }

    #[tokio::test]
    async fn test_put_marks_bin_limits() {
        let repo = Arc::new(MemoryRepository::default());
        let app = state(repo.clone(), 8).await;

        let response = put_marks_bin(State(app.clone()), Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = put_marks_bin(State(app.clone()), Bytes::from(vec![0u8; 9])).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);

        let payload = Bytes::from_static(&[1, 2, 0, 0, 0, 60, b'a', 0]);
        let response = put_marks_bin(State(app.clone()), payload.clone()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(*repo.marks.lock().unwrap(), payload);
        assert_eq!(app.marks.lock().await.marks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_marks_txt_commit_protocol() {
        let repo = Arc::new(MemoryRepository::default());
        let app = state(repo.clone(), 12).await;

        let response = put_marks_txt(State(app.clone()), "\n".into()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);

        let response = put_marks_txt(State(app.clone()), "#0 :: 2024-06-10T08:00:00Z :: a\n".into()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
        assert_eq!(repo.marks.lock().unwrap().len(), 8);

        let edit = "#0 :: 2024-06-10T08:00:00Z :: a\n#1 :: 2024-06-10T09:00:00Z :: b\n";
        let response = put_marks_txt(State(app.clone()), edit.into()).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_text(response).await, "Too much data (limit=12B)");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);

        let text = body_text(get_marks_txt(State(app)).await).await;
        assert_eq!(text.lines().count(), 2);
    }
}
