use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Podium Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::scores::submit_score,
        crate::routes::scores::list_scores,
        crate::routes::scores::list_pending_scores,
        crate::routes::scores::score_stats,
        crate::routes::scores::team_scores,
        crate::routes::scores::get_score,
        crate::routes::scores::validate_score,
        crate::routes::scores::reject_score,
        crate::routes::scores::delete_score,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::leaderboard::get_team_rank,
        crate::routes::sse::leaderboard_stream,
        crate::routes::sse::team_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::ServiceCondition,
            crate::dto::score::SubmitScoreRequest,
            crate::dto::score::ValidateScoreRequest,
            crate::dto::score::RejectScoreRequest,
            crate::dto::score::ScoreResponse,
            crate::dto::score::ScoreListResponse,
            crate::dto::score::TeamScoresResponse,
            crate::dto::score::ScoreStatsResponse,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::TeamRankResponse,
            crate::dto::sse::ScoreSubmittedEvent,
            crate::dto::sse::LeaderboardUpdatedEvent,
            crate::dto::sse::ScoreUpdatedEvent,
            crate::dao::models::ScoreStatus,
            crate::dao::models::Badge,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scores", description = "Score submission and validation lifecycle"),
        (name = "leaderboard", description = "Public standings"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
