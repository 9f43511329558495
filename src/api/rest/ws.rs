use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.matcher.subscribe());

    info!("match event subscriber connected");

    let send_task = tokio::spawn(async move {
        while let Some(next) = events.next().await {
            let event = match next {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "match event subscriber fell behind");
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize match event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    race_to_close(send_task, recv_task).await;

    info!("match event subscriber disconnected");
}

/// Waits for either half of the socket to finish and aborts the other.
async fn race_to_close(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::race_to_close;

    #[tokio::test]
    async fn closing_one_half_aborts_the_other() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let idle = tokio::spawn(async move {
            let _alive = alive_tx;
            futures::future::pending::<()>().await;
        });
        let finished = tokio::spawn(async {});

        race_to_close(idle, finished).await;

        // the sender is dropped once the idle task is torn down
        let dropped = tokio::time::timeout(Duration::from_secs(1), alive_rx)
            .await
            .expect("idle task was not aborted");
        assert!(dropped.is_err());
    }
}
