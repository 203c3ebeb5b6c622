use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::core::recorder::TOP_OFFENDERS_CAP;
use crate::core::time;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// GET /api/top_uas
pub async fn top_uas(State(state): State<AppState>, Query(query): Query<TopQuery>) -> Response {
    let limit = query.limit.unwrap_or(TOP_OFFENDERS_CAP);
    match state.recorder.top_offenders(limit) {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "top offenders query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "message": err.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub secs: Option<i64>,
}

/// GET /api/recent
pub async fn recent(State(state): State<AppState>, Query(query): Query<RecentQuery>) -> Response {
    let window = query.secs.unwrap_or(3600).max(0);
    let cutoff = time::now_secs() - window;
    match state.recorder.events_since(cutoff) {
        Ok(events) => Json(events).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "recent events query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "message": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}
