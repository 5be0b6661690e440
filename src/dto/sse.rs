//! Payloads carried over the realtime channels.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::ScoreStatus;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// Serialized JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build a plain-text event.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the global channel when a team submits a new score.
pub struct ScoreSubmittedEvent {
    /// Newly created score.
    pub score_id: Uuid,
    /// Submitting team.
    pub team_id: Uuid,
    /// Claimed challenge.
    pub challenge_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the global channel after a validation credits a team.
pub struct LeaderboardUpdatedEvent {
    /// Credited team.
    pub team_id: Uuid,
    /// Team score after the credit.
    pub new_score: i64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the team channel whenever one of its scores is resolved.
pub struct ScoreUpdatedEvent {
    /// Resolved score.
    pub score_id: Uuid,
    /// New lifecycle status.
    pub status: ScoreStatus,
}
