//! WebSocket live feed: one JSON snapshot per frame at `server.live_feed_hz`.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use super::ApiState;
use crate::types::{HardwareSnapshot, SimulationState};

#[derive(Debug, Serialize)]
struct LiveFrame<'a> {
    running: bool,
    state: &'a SimulationState,
    hardware: &'a HardwareSnapshot,
}

/// GET /api/v1/live
pub async fn live_feed(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| stream_snapshots(socket, state))
}

async fn stream_snapshots(socket: WebSocket, state: ApiState) {
    let (mut sender, mut receiver) = socket.split();
    let hz = state.config.server.live_feed_hz;
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / hz));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_tick = None;

    debug!(hz, "Live feed client connected");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = state.shared.snapshot();
                let hardware = state.shared.hardware();
                // skip frames while nothing moved
                if last_tick == Some(snapshot.tick) && !hardware.enabled {
                    continue;
                }
                last_tick = Some(snapshot.tick);

                let frame = LiveFrame {
                    running: state.controller.is_running(),
                    state: &snapshot,
                    hardware: &hardware,
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize live frame");
                        break;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("Live feed client disconnected");
}
