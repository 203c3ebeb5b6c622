use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::core::error::HarrierError;
use crate::core::event::{ScoredEvent, UaSample};
use crate::core::hub::FeedFrame;
use crate::core::{alert, scorer};

use super::AppState;

pub enum Outcome {
    Scored(ScoredEvent),
    Bypassed,
}

/// POST /log_ua
pub async fn log_ua(State(state): State<AppState>, Json(sample): Json<UaSample>) -> Response {
    {
        let mut throttle = state.throttle.lock().expect("throttle lock poisoned");
        if !throttle.allow() {
            tracing::warn!("ingest budget exceeded, rejecting");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": "ingest budget exceeded" })),
            )
                .into_response();
        }
    }

    match ingest(&state, sample).await {
        Ok(Outcome::Bypassed) => StatusCode::NO_CONTENT.into_response(),
        Ok(Outcome::Scored(event)) => Json(json!({
            "riskScore": event.risk_score,
            "threatCategories": event.threat_categories,
        }))
        .into_response(),
        Err(HarrierError::Validation(message)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": message })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": err.to_string() })),
        )
            .into_response(),
    }
}

/// Validate, score, persist, then fan out. The hub never sees an event that
/// failed to persist.
pub async fn ingest(state: &AppState, sample: UaSample) -> Result<Outcome, HarrierError> {
    let sample = sample.validate().map_err(|err| {
        tracing::warn!(error = %err, "rejected ingest payload");
        err
    })?;

    if is_bypassed(&state.config.bypass_hosts, &sample.url) {
        tracing::debug!(url = %sample.url, "bypass host, not scored");
        return Ok(Outcome::Bypassed);
    }

    let score = scorer::score(
        &state.patterns,
        sample.user_agent.as_deref(),
        &sample.url,
        state.config.baseline_score,
    );
    let stored_ua = sample.stored_ua();
    let ts_secs = sample.ts_millis / 1000;

    let id = state
        .recorder
        .record(
            &stored_ua,
            &sample.url,
            sample.is_http,
            score.risk,
            &score.categories,
            ts_secs,
        )
        .map_err(|err| {
            tracing::error!(error = %err, ua = %stored_ua, url = %sample.url, "failed to persist event");
            err
        })?;

    let event = ScoredEvent {
        id,
        user_agent: stored_ua,
        url: sample.url,
        is_http: sample.is_http,
        risk_score: score.risk,
        threat_categories: score.categories,
        timestamp_seconds: ts_secs,
    };

    let new_ua = state.recent.mark(&event.user_agent);
    let delivered = state.hub.publish(FeedFrame {
        id: event.id,
        user_agent: event.user_agent.clone(),
        is_http: event.is_http,
        timestamp_ms: sample.ts_millis,
        risk_score: event.risk_score,
        new_ua,
        src_ip: sample.src_ip,
    });
    tracing::debug!(id = event.id, risk = event.risk_score, delivered, "event scored");

    if let Some(webhook_url) = state.config.alerts.webhook_url.as_deref() {
        if alert::meets_floor(event.risk_score, state.config.alerts.min_risk) {
            if let Err(err) = alert::send_webhook_alert(&state.http_client, webhook_url, &event).await
            {
                tracing::warn!(error = %err, "webhook alert failed");
            }
        }
    }

    Ok(Outcome::Scored(event))
}

fn is_bypassed(bypass_hosts: &[String], url: &str) -> bool {
    let host = host_of(url);
    if host == "localhost" || host == "127.0.0.1" {
        return true;
    }
    bypass_hosts.iter().any(|b| host.contains(b.as_str()))
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let end = rest.find(['/', ':', '?']).unwrap_or(rest.len());
    &rest[..end]
}
