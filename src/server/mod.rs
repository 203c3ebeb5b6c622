//! HTTP/WebSocket surface: ingestion entry, aggregate reads, the live feed
//! and the liveness probe.

pub mod api;
pub mod feed;
pub mod ingest;
pub mod throttle;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::AppConfig;
use crate::core::dedupe::RecentUas;
use crate::core::error::HarrierError;
use crate::core::hub::FeedHub;
use crate::core::patterns::PatternDb;
use crate::core::recorder::EventRecorder;

use self::throttle::IngestThrottle;

const WEBHOOK_TIMEOUT_MS: u64 = 2_000;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub patterns: Arc<PatternDb>,
    pub recorder: Arc<EventRecorder>,
    pub hub: Arc<FeedHub>,
    pub recent: Arc<RecentUas>,
    pub throttle: Arc<Mutex<IngestThrottle>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, HarrierError> {
        let patterns = PatternDb::builtin()?;
        let recorder = EventRecorder::new(Path::new(&config.db_path))?;
        let http_client = reqwest::Client::builder()
            .user_agent("harrier/1.0")
            .timeout(Duration::from_millis(WEBHOOK_TIMEOUT_MS))
            .build()
            .map_err(HarrierError::from)?;
        Ok(Self {
            patterns: Arc::new(patterns),
            recorder: Arc::new(recorder),
            hub: Arc::new(FeedHub::new()),
            recent: Arc::new(RecentUas::new(config.dedupe_window)),
            throttle: Arc::new(Mutex::new(IngestThrottle::new(config.max_ingest_per_sec))),
            http_client,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/log_ua", post(ingest::log_ua))
        .route("/api/top_uas", get(api::top_uas))
        .route("/api/recent", get(api::recent))
        .route("/health", get(api::health))
        .route("/ws/scanner", get(feed::ws_scanner))
        .with_state(state)
}

pub async fn serve(state: AppState, bind_addr: &str) -> Result<(), HarrierError> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| HarrierError::Config(format!("failed to bind {bind_addr}: {e}")))?;
    tracing::info!(addr = %bind_addr, "scanner listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| HarrierError::Transport(e.to_string()))?;
    Ok(())
}
