use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;

use crate::dashboard::DashboardEvent;
use crate::AppState;

/// GET /ws: live dashboard events.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| event_feed(socket, state))
}

/// Serialize and send one event. `false` means the client is gone.
async fn push(socket: &mut WebSocket, event: &DashboardEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize dashboard event");
            true
        }
    }
}

async fn event_feed(mut socket: WebSocket, state: AppState) {
    // Subscribe before the snapshot so nothing published in between is lost.
    let mut rx = state.dashboard.subscribe();
    tracing::info!("Event feed client connected");

    let snapshot = [
        DashboardEvent::ConnectionChanged {
            status: state.dashboard.connection_status().await,
        },
        DashboardEvent::OpportunitiesUpdated {
            count: state.dashboard.stats().await.total,
        },
    ];
    for event in &snapshot {
        if !push(&mut socket, event).await {
            return;
        }
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if !push(&mut socket, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Client will catch up from the next full refresh.
                    tracing::warn!(skipped, "Event feed client lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("Event feed client disconnected");
}
