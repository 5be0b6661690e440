//! Plumbing that turns a broadcast receiver into an SSE response stream.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{dto::sse::ServerEvent, state::SharedState};

/// Subscribe to the global leaderboard channel.
pub fn subscribe_global(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.global_hub().subscribe()
}

/// Subscribe to a team-scoped channel, creating the hub on first join.
/// Entry control is the gateway's responsibility; this is a pure relay.
pub fn subscribe_team(state: &SharedState, team_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.team_channels().hub(team_id).subscribe()
}

/// Identifies the subscribed channel so teardown can log which stream
/// disconnected.
#[derive(Clone)]
pub enum StreamKind {
    /// Global leaderboard channel.
    Global,
    /// One team's channel.
    Team(Uuid),
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // At-most-once delivery: skip what was missed
                            // but keep the stream alive; the client
                            // reconciles over REST.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Global => tracing::info!("leaderboard SSE stream disconnected"),
            StreamKind::Team(team_id) => {
                tracing::info!(%team_id, "team SSE stream disconnected")
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Send a human-readable info message onto a hub when a client connects.
pub fn broadcast_info(hub: &crate::state::SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}
