//! Public leaderboard endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::leaderboard::{LeaderboardResponse, TeamRankResponse},
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Configure the leaderboard subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/leaderboard/{team_id}", get(get_team_rank))
}

/// Full ranking of every team, ties sharing a rank.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Ranked teams", body = LeaderboardResponse))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::leaderboard(&state).await?))
}

/// One team's current score and rank.
#[utoipa::path(
    get,
    path = "/leaderboard/{team_id}",
    tag = "leaderboard",
    params(("team_id" = Uuid, Path, description = "Team to rank")),
    responses(
        (status = 200, description = "Team rank", body = TeamRankResponse),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team_rank(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamRankResponse>, AppError> {
    Ok(Json(leaderboard_service::team_rank(&state, team_id).await?))
}
