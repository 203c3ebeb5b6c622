use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;

use crate::core::error::HarrierError;
use crate::core::event::UaSample;

use super::{ingest, AppState};

/// GET /ws/scanner: the live-tail feed. Viewers receive every event scored
/// while they are connected; there is no replay for late joiners.
pub async fn ws_scanner(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| scanner_session(socket, state))
}

async fn scanner_session(mut socket: WebSocket, state: AppState) {
    let mut feed = state.hub.subscribe();
    tracing::info!(viewers = state.hub.viewer_count(), "scanner viewer connected");

    loop {
        tokio::select! {
            frame = feed.recv() => match frame {
                Ok(frame) => {
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::error!(error = %err, "frame encode failed");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "viewer lagged behind the feed");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(err) = manual_submit(&state, &text).await {
                        tracing::warn!(error = %err, raw = %text, "manual submission rejected");
                        let reply = serde_json::json!({ "message": err.to_string() }).to_string();
                        if socket.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "viewer transport error");
                    break;
                }
            },
        }
    }

    tracing::info!("scanner viewer disconnected");
}

/// Form-driven submissions arriving over the socket run the same pipeline as
/// POST /log_ua; validation failures are answered on the socket itself.
async fn manual_submit(state: &AppState, text: &str) -> Result<(), HarrierError> {
    let sample: UaSample = serde_json::from_str(text)
        .map_err(|e| HarrierError::Validation(format!("bad payload: {e}")))?;
    ingest::ingest(state, sample).await?;
    Ok(())
}
