//! Realtime SSE endpoints. Both streams are public relays; the gateway
//! decides who may reach them.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

/// Configure the SSE subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sse/leaderboard", get(leaderboard_stream))
        .route("/sse/team/{team_id}", get(team_stream))
}

/// Global stream carrying score submissions and leaderboard updates.
#[utoipa::path(
    get,
    path = "/sse/leaderboard",
    tag = "sse",
    responses((status = 200, description = "SSE stream of contest-wide events"))
)]
pub async fn leaderboard_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("client joined leaderboard SSE stream");
    let receiver = sse_service::subscribe_global(&state);
    sse_service::broadcast_info(state.global_hub(), "connected to leaderboard stream");
    sse_service::to_sse_stream(receiver, StreamKind::Global)
}

/// Team-scoped stream carrying that team's score resolutions.
#[utoipa::path(
    get,
    path = "/sse/team/{team_id}",
    tag = "sse",
    params(("team_id" = Uuid, Path, description = "Team channel to join")),
    responses((status = 200, description = "SSE stream of team events"))
)]
pub async fn team_stream(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(%team_id, "client joined team SSE stream");
    let receiver = sse_service::subscribe_team(&state, team_id);
    sse_service::broadcast_info(
        &state.team_channels().hub(team_id),
        "connected to team stream",
    );
    sse_service::to_sse_stream(receiver, StreamKind::Team(team_id))
}
