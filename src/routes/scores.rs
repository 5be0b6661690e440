//! Score lifecycle endpoints. Submission is open to team members; the
//! validate/reject/delete operations and the listings require an
//! administrator principal supplied by the gateway.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        auth::Principal,
        score::{
            RejectScoreRequest, ScoreListQuery, ScoreListResponse, ScoreResponse,
            ScoreStatsResponse, SubmitScoreRequest, TeamScoresResponse, ValidateScoreRequest,
        },
    },
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Configure the score lifecycle subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/scores", post(submit_score).get(list_scores))
        .route("/scores/pending", get(list_pending_scores))
        .route("/scores/stats", get(score_stats))
        .route("/scores/team/{team_id}", get(team_scores))
        .route("/scores/{id}/validate", put(validate_score))
        .route("/scores/{id}/reject", put(reject_score))
        .route("/scores/{id}", get(get_score).delete(delete_score))
}

/// Submit a score claim for a challenge on behalf of the caller's team.
#[utoipa::path(
    post,
    path = "/scores",
    tag = "scores",
    request_body = SubmitScoreRequest,
    responses(
        (status = 201, description = "Score created, awaiting validation", body = ScoreResponse),
        (status = 400, description = "Challenge inactive or expired"),
        (status = 403, description = "Caller has no team"),
        (status = 409, description = "Team already submitted for this challenge")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<SubmitScoreRequest>>,
) -> Result<(StatusCode, Json<ScoreResponse>), AppError> {
    let score = score_service::submit(&state, &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(score)))
}

/// List every score, optionally filtered by status, team, or challenge.
#[utoipa::path(
    get,
    path = "/scores",
    tag = "scores",
    params(ScoreListQuery),
    responses((status = 200, description = "Matching scores", body = ScoreListResponse))
)]
pub async fn list_scores(
    State(state): State<SharedState>,
    principal: Principal,
    Query(query): Query<ScoreListQuery>,
) -> Result<Json<ScoreListResponse>, AppError> {
    Ok(Json(score_service::list_all(&state, &principal, query).await?))
}

/// List the scores awaiting an administrator decision.
#[utoipa::path(
    get,
    path = "/scores/pending",
    tag = "scores",
    responses((status = 200, description = "Pending scores", body = ScoreListResponse))
)]
pub async fn list_pending_scores(
    State(state): State<SharedState>,
    principal: Principal,
) -> Result<Json<ScoreListResponse>, AppError> {
    Ok(Json(score_service::list_pending(&state, &principal).await?))
}

/// Contest-wide score counters for the admin dashboard.
#[utoipa::path(
    get,
    path = "/scores/stats",
    tag = "scores",
    responses((status = 200, description = "Aggregate score statistics", body = ScoreStatsResponse))
)]
pub async fn score_stats(
    State(state): State<SharedState>,
    principal: Principal,
) -> Result<Json<ScoreStatsResponse>, AppError> {
    Ok(Json(score_service::stats(&state, &principal).await?))
}

/// One team's scores together with aggregate counters. Public.
#[utoipa::path(
    get,
    path = "/scores/team/{team_id}",
    tag = "scores",
    params(("team_id" = Uuid, Path, description = "Team whose scores to list")),
    responses((status = 200, description = "Team scores and stats", body = TeamScoresResponse))
)]
pub async fn team_scores(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamScoresResponse>, AppError> {
    Ok(Json(score_service::team_scores(&state, team_id).await?))
}

/// Fetch one score; visible to administrators and the owning team.
#[utoipa::path(
    get,
    path = "/scores/{id}",
    tag = "scores",
    params(("id" = Uuid, Path, description = "Score to fetch")),
    responses(
        (status = 200, description = "The score", body = ScoreResponse),
        (status = 403, description = "Score belongs to another team"),
        (status = 404, description = "Unknown score")
    )
)]
pub async fn get_score(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(score_service::get(&state, &principal, id).await?))
}

/// Validate a pending score, crediting the team and firing the realtime
/// leaderboard update.
#[utoipa::path(
    put,
    path = "/scores/{id}/validate",
    tag = "scores",
    params(("id" = Uuid, Path, description = "Score to validate")),
    request_body = ValidateScoreRequest,
    responses(
        (status = 200, description = "Score validated", body = ScoreResponse),
        (status = 404, description = "Unknown score"),
        (status = 409, description = "Score is no longer pending")
    )
)]
pub async fn validate_score(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ValidateScoreRequest>>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(
        score_service::validate(&state, &principal, id, payload).await?,
    ))
}

/// Reject a pending score with a mandatory explanation note.
#[utoipa::path(
    put,
    path = "/scores/{id}/reject",
    tag = "scores",
    params(("id" = Uuid, Path, description = "Score to reject")),
    request_body = RejectScoreRequest,
    responses(
        (status = 200, description = "Score rejected", body = ScoreResponse),
        (status = 400, description = "Missing rejection note"),
        (status = 404, description = "Unknown score"),
        (status = 409, description = "Score is no longer pending")
    )
)]
pub async fn reject_score(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RejectScoreRequest>>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(
        score_service::reject(&state, &principal, id, payload).await?,
    ))
}

/// Delete a score, issuing a compensating debit when it was validated.
#[utoipa::path(
    delete,
    path = "/scores/{id}",
    tag = "scores",
    params(("id" = Uuid, Path, description = "Score to delete")),
    responses(
        (status = 204, description = "Score deleted"),
        (status = 404, description = "Unknown score")
    )
)]
pub async fn delete_score(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    score_service::delete(&state, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
