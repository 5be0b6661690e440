//! Internal event outbox decoupling the lifecycle manager from the
//! broadcast hubs. Services push [`ContestEvent`]s after their
//! authoritative write commits; the dispatcher task drains the queue and
//! fans the events out, so a slow or failing publish can never block or
//! roll back a state change.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::ScoreStatus,
    dto::sse::{LeaderboardUpdatedEvent, ScoreSubmittedEvent, ScoreUpdatedEvent, ServerEvent},
    state::SharedState,
};

const EVENT_SCORE_SUBMITTED: &str = "score-submitted";
const EVENT_LEADERBOARD_UPDATED: &str = "leaderboard-updated";
const EVENT_SCORE_UPDATED: &str = "score-updated";

/// State transition notifications produced by the lifecycle manager.
#[derive(Debug, Clone)]
pub enum ContestEvent {
    /// A new pending score was created. Global channel.
    ScoreSubmitted {
        /// Newly created score.
        score_id: Uuid,
        /// Submitting team.
        team_id: Uuid,
        /// Claimed challenge.
        challenge_id: Uuid,
    },
    /// A validation credited a team. Global channel.
    LeaderboardUpdated {
        /// Credited team.
        team_id: Uuid,
        /// Score after the credit.
        new_score: i64,
    },
    /// A score reached a terminal status. Team channel only.
    ScoreResolved {
        /// Team whose channel receives the event.
        team_id: Uuid,
        /// Resolved score.
        score_id: Uuid,
        /// New status.
        status: ScoreStatus,
    },
}

/// Drain the outbox until every sender is gone, fanning each event out to
/// the appropriate channel scope.
pub async fn run_dispatcher(state: SharedState, mut receiver: mpsc::UnboundedReceiver<ContestEvent>) {
    while let Some(event) = receiver.recv().await {
        dispatch(&state, event);
    }
    debug!("event outbox closed; dispatcher exiting");
}

fn dispatch(state: &SharedState, event: ContestEvent) {
    match event {
        ContestEvent::ScoreSubmitted {
            score_id,
            team_id,
            challenge_id,
        } => {
            let payload = ScoreSubmittedEvent {
                score_id,
                team_id,
                challenge_id,
            };
            send_global(state, EVENT_SCORE_SUBMITTED, &payload);
        }
        ContestEvent::LeaderboardUpdated { team_id, new_score } => {
            let payload = LeaderboardUpdatedEvent { team_id, new_score };
            send_global(state, EVENT_LEADERBOARD_UPDATED, &payload);
        }
        ContestEvent::ScoreResolved {
            team_id,
            score_id,
            status,
        } => {
            let payload = ScoreUpdatedEvent { score_id, status };
            send_to_team(state, team_id, EVENT_SCORE_UPDATED, &payload);
        }
    }
}

fn send_global(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.global_hub().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize global event payload"),
    }
}

fn send_to_team(state: &SharedState, team_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.team_channels().broadcast(team_id, event),
        Err(err) => {
            warn!(event, %team_id, error = %err, "failed to serialize team event payload")
        }
    }
}
