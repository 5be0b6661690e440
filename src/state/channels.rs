//! Broadcast plumbing for the realtime fan-out: one global `leaderboard`
//! hub plus lazily created per-team hubs. The broadcaster is a pure relay;
//! entry control for team channels belongs to the external auth gateway.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Channel sub-state carved out from [`AppState`](super::AppState).
pub struct ChannelState {
    global: SseHub,
    teams: TeamChannels,
}

impl ChannelState {
    /// Build the channel tree with per-scope capacities.
    pub fn new(global_capacity: usize, team_capacity: usize) -> Self {
        Self {
            global: SseHub::new(global_capacity),
            teams: TeamChannels::new(team_capacity),
        }
    }

    /// Hub shared by every subscriber of the global leaderboard channel.
    pub fn global(&self) -> &SseHub {
        &self.global
    }

    /// Registry of per-team hubs.
    pub fn teams(&self) -> &TeamChannels {
        &self.teams
    }
}

/// Lazily created per-team broadcast hubs keyed by team id.
pub struct TeamChannels {
    hubs: DashMap<Uuid, Arc<SseHub>>,
    capacity: usize,
}

impl TeamChannels {
    fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Fetch the hub for `team_id`, creating it on first use.
    pub fn hub(&self, team_id: Uuid) -> Arc<SseHub> {
        self.hubs
            .entry(team_id)
            .or_insert_with(|| Arc::new(SseHub::new(self.capacity)))
            .clone()
    }

    /// Deliver `event` to the team channel. A channel nobody has joined yet
    /// simply drops the event; delivery is at-most-once by design.
    pub fn broadcast(&self, team_id: Uuid, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(&team_id) {
            hub.broadcast(event);
        }
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> ServerEvent {
        ServerEvent {
            event: Some(name.to_string()),
            data: "{}".into(),
        }
    }

    #[tokio::test]
    async fn team_hub_is_reused_per_team() {
        let channels = TeamChannels::new(4);
        let team = Uuid::new_v4();

        let mut receiver = channels.hub(team).subscribe();
        channels.broadcast(team, event("score-updated"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("score-updated"));
    }

    #[tokio::test]
    async fn broadcast_to_unjoined_team_is_dropped() {
        let channels = TeamChannels::new(4);
        // No subscriber ever joined; nothing to assert beyond not panicking.
        channels.broadcast(Uuid::new_v4(), event("score-updated"));
    }
}
