use crate::frame::FrameRecord;
use crate::store::FrameStore;
use crate::worker::IngestStats;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

const PAGE_TEMPLATE: &str = include_str!("../assets/index.html");
const POLL_INTERVAL_PLACEHOLDER: &str = "{{POLL_INTERVAL_MS}}";

/// Shared by every request handler. Only reads the store, except `/clear`.
#[derive(Clone)]
pub struct AppState {
    store: Arc<FrameStore>,
    stats: Arc<IngestStats>,
    page: Bytes,
}

impl AppState {
    pub fn new(store: Arc<FrameStore>, stats: Arc<IngestStats>, poll_interval: Duration) -> Self {
        Self {
            store,
            stats,
            page: Bytes::from(render_page(poll_interval)),
        }
    }
}

pub fn render_page(poll_interval: Duration) -> String {
    PAGE_TEMPLATE.replace(
        POLL_INTERVAL_PLACEHOLDER,
        &poll_interval.as_millis().max(1).to_string(),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/data", get(data))
        .route("/clear", post(clear))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Serves until `shutdown` is notified.
pub async fn serve(
    listener: TcpListener, state: AppState, shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
}

async fn index(State(state): State<AppState>) -> Html<Bytes> {
    Html(state.page.clone())
}

async fn data(State(state): State<AppState>) -> Json<Vec<Arc<FrameRecord>>> {
    Json(state.store.snapshot())
}

#[derive(Serialize)]
struct ClearResponse {
    success: bool,
}

async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    state.store.clear();
    log::info!("Frame store cleared.");

    Json(ClearResponse { success: true })
}

#[derive(Serialize)]
struct StatsResponse {
    frames: usize,
    capacity: usize,
    last_id: u64,
    received: u64,
    appended: u64,
    decode_failures: u64,
    transport_failures: u64,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        frames: state.store.size(),
        capacity: state.store.capacity(),
        last_id: state.store.last_id(),
        received: state.stats.received(),
        appended: state.stats.appended(),
        decode_failures: state.stats.decode_failures(),
        transport_failures: state.stats.transport_failures(),
    })
}
