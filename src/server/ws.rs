use crate::analyzer::AnalysisOutcome;
use crate::noise::SeededNoise;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

/// WebSocket upgrade handler. Each client gets its own refresh loop: a
/// fresh chain is generated and analyzed per push, so connections share
/// nothing but the read-only state.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let refresh = tokio::time::Duration::from_secs(state.config.ws_refresh_secs.max(1));

    let push_state = state.clone();
    let send_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh);
        loop {
            interval.tick().await;
            let payload = refresh_payload(&push_state);
            match serde_json::to_string(&payload) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                    push_state.counters.ws_messages_sent.fetch_add(1, Relaxed);
                }
                Err(e) => {
                    tracing::error!(error = %e, "ws payload serialization failed");
                    break;
                }
            }
        }
    });

    // Read (and discard) incoming messages; detect disconnect
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {} // Ignore client messages
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    tracing::debug!("ws client disconnected");
}

/// One full refresh: synthetic chain, analysis pass, scorer output.
/// Failures ride along as the structured failure payload; the socket
/// stays up either way.
fn refresh_payload(state: &AppState) -> serde_json::Value {
    let mut noise = SeededNoise::from_entropy();
    let snapshot = state
        .generator
        .generate(&state.config.default_symbol, None, &mut noise);
    state.counters.chains_generated.fetch_add(1, Relaxed);

    let outcome = state.analyzer.analyze(&snapshot, &mut noise);
    let (predictions, status) = match &outcome {
        AnalysisOutcome::Completed(result) => {
            state.counters.analyses_completed.fetch_add(1, Relaxed);
            (state.scorer.score_strategies(&result.strategies), "success")
        }
        AnalysisOutcome::Failed { .. } => {
            state.counters.analyses_failed.fetch_add(1, Relaxed);
            (Vec::new(), "error")
        }
    };

    serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "option_chain": snapshot,
        "analysis": outcome,
        "predictions": predictions,
        "status": status,
    })
}
