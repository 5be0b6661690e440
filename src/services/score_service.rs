//! Score lifecycle manager: submission, validation, rejection, and deletion
//! of scores, honouring the uniqueness, single-transition, and exactly-once
//! credit invariants. Every guarded mutation is delegated to a single
//! atomic storage operation; this module never does check-then-write.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{ScoreEntity, ScoreFilter, ScoreResolution, ScoreStatus},
    dto::{
        auth::Principal,
        score::{
            RejectScoreRequest, ScoreListQuery, ScoreListResponse, ScoreResponse,
            ScoreStatsResponse, SubmitScoreRequest, TeamScoresResponse, ValidateScoreRequest,
        },
    },
    error::ServiceError,
    services::{badge_service, events::ContestEvent, leaderboard_service},
    state::SharedState,
};

/// Create a pending score for the principal's team.
///
/// The (team, challenge) uniqueness check is the storage layer's unique
/// index, so two near-simultaneous submissions cannot both land; the loser
/// surfaces as `Conflict`.
pub async fn submit(
    state: &SharedState,
    principal: &Principal,
    request: SubmitScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    let team_id = principal.require_team()?;
    let store = state.require_contest_store().await?;

    let challenge = store
        .find_challenge(request.challenge_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("challenge `{}` not found", request.challenge_id))
        })?;

    let now = SystemTime::now();
    if !challenge.is_active {
        return Err(ServiceError::InvalidInput(
            "this challenge is no longer active".into(),
        ));
    }
    if challenge.is_expired(now) {
        return Err(ServiceError::InvalidInput(
            "this challenge has expired".into(),
        ));
    }
    if challenge.is_urgent(now, state.config().urgent_window()) {
        info!(challenge_id = %challenge.id, "submission against a challenge close to its deadline");
    }

    let score = ScoreEntity {
        id: Uuid::new_v4(),
        team_id,
        challenge_id: challenge.id,
        // Snapshot of the challenge's point value; later challenge edits
        // never retroactively change a submission's worth.
        points_earned: challenge.points,
        submitted_by: principal.user_id,
        validated_by: None,
        status: ScoreStatus::Pending,
        submission_note: request.note.unwrap_or_default(),
        validation_note: String::new(),
        submitted_at: now,
        validated_at: None,
    };

    store.insert_score(score.clone()).await?;
    info!(score_id = %score.id, %team_id, challenge_id = %challenge.id, "score submitted");

    state.publish(ContestEvent::ScoreSubmitted {
        score_id: score.id,
        team_id,
        challenge_id: challenge.id,
    });

    Ok(score.into())
}

/// Validate a pending score: transition it, credit the team, evaluate
/// badges, and notify both channel scopes.
pub async fn validate(
    state: &SharedState,
    principal: &Principal,
    score_id: Uuid,
    request: ValidateScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    principal.require_admin()?;
    let store = state.require_contest_store().await?;

    let resolution =
        ScoreResolution::validated(principal.user_id, request.note.unwrap_or_default());
    let score = resolve_pending(state, score_id, resolution).await?;

    // The status CAS above is the authoritative write; the credit comes
    // second so it can never run for a score that did not transition. If
    // the credit itself fails the score is left validated-but-uncredited
    // and needs a reconciliation pass.
    let team = match leaderboard_service::credit(&store, score.team_id, score.points_earned).await
    {
        Ok(team) => team,
        Err(err) => {
            warn!(
                %score_id,
                team_id = %score.team_id,
                points = score.points_earned,
                "score validated but team credit failed; reconciliation required"
            );
            return Err(err);
        }
    };
    info!(%score_id, team_id = %team.id, new_score = team.score, "score validated");

    let validated_count = store
        .count_scores(ScoreFilter::validated_for_team(team.id))
        .await?;
    if let Err(err) = badge_service::apply_after_validation(&store, &team, &score, validated_count).await
    {
        // Badges are decorative; the credit already committed, so log and move on.
        warn!(team_id = %team.id, error = %err, "badge evaluation failed after validation");
    }

    state.publish(ContestEvent::LeaderboardUpdated {
        team_id: team.id,
        new_score: team.score,
    });
    state.publish(ContestEvent::ScoreResolved {
        team_id: team.id,
        score_id: score.id,
        status: ScoreStatus::Validated,
    });

    Ok(score.into())
}

/// Reject a pending score with a mandatory note. No points move; only the
/// team channel is notified.
pub async fn reject(
    state: &SharedState,
    principal: &Principal,
    score_id: Uuid,
    request: RejectScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    principal.require_admin()?;

    let note = request.note.trim().to_owned();
    if note.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a rejection note is required".into(),
        ));
    }

    let resolution = ScoreResolution::rejected(principal.user_id, note);
    let score = resolve_pending(state, score_id, resolution).await?;
    info!(%score_id, team_id = %score.team_id, "score rejected");

    state.publish(ContestEvent::ScoreResolved {
        team_id: score.team_id,
        score_id: score.id,
        status: ScoreStatus::Rejected,
    });

    Ok(score.into())
}

/// Remove a score record. The removal is a single atomic operation that
/// hands back the deleted document, so of two concurrent deletes only the
/// winner issues the compensating debit for a validated score.
/// Administrative housekeeping; no realtime event is published.
pub async fn delete(
    state: &SharedState,
    principal: &Principal,
    score_id: Uuid,
) -> Result<(), ServiceError> {
    principal.require_admin()?;
    let store = state.require_contest_store().await?;

    let score = store
        .delete_score(score_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score `{score_id}` not found")))?;
    info!(%score_id, "score deleted");

    if score.status == ScoreStatus::Validated {
        let team = leaderboard_service::debit(&store, score.team_id, score.points_earned).await?;
        info!(
            %score_id,
            team_id = %team.id,
            points = score.points_earned,
            new_score = team.score,
            "compensating debit for deleted validated score"
        );
    }

    Ok(())
}

/// Fetch a single score. Administrators see everything; anyone else only
/// gets submissions belonging to their own team.
pub async fn get(
    state: &SharedState,
    principal: &Principal,
    score_id: Uuid,
) -> Result<ScoreResponse, ServiceError> {
    let store = state.require_contest_store().await?;

    let score = store
        .find_score(score_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score `{score_id}` not found")))?;

    if principal.require_admin().is_err() && principal.team_id != Some(score.team_id) {
        return Err(ServiceError::Forbidden(
            "you may only view your own team's scores".into(),
        ));
    }

    Ok(score.into())
}

/// All pending scores awaiting an administrator decision, newest first.
pub async fn list_pending(
    state: &SharedState,
    principal: &Principal,
) -> Result<ScoreListResponse, ServiceError> {
    principal.require_admin()?;
    let store = state.require_contest_store().await?;
    let scores = store.list_scores(ScoreFilter::pending()).await?;
    Ok(scores.into())
}

/// All scores matching the optional status/team/challenge filters.
pub async fn list_all(
    state: &SharedState,
    principal: &Principal,
    query: ScoreListQuery,
) -> Result<ScoreListResponse, ServiceError> {
    principal.require_admin()?;
    let store = state.require_contest_store().await?;
    let scores = store.list_scores(query.into()).await?;
    Ok(scores.into())
}

/// A single team's scores plus aggregate counters. Public.
pub async fn team_scores(
    state: &SharedState,
    team_id: Uuid,
) -> Result<TeamScoresResponse, ServiceError> {
    let store = state.require_contest_store().await?;
    let scores = store.list_scores(ScoreFilter::for_team(team_id)).await?;
    Ok(scores.into())
}

/// Contest-wide counters for the admin dashboard.
pub async fn stats(
    state: &SharedState,
    principal: &Principal,
) -> Result<ScoreStatsResponse, ServiceError> {
    principal.require_admin()?;
    let store = state.require_contest_store().await?;

    let total = store.count_scores(ScoreFilter::default()).await?;
    let pending = store
        .count_scores(ScoreFilter::with_status(ScoreStatus::Pending))
        .await?;
    let validated_scores = store
        .list_scores(ScoreFilter::with_status(ScoreStatus::Validated))
        .await?;
    let rejected = store
        .count_scores(ScoreFilter::with_status(ScoreStatus::Rejected))
        .await?;

    Ok(ScoreStatsResponse {
        total,
        pending,
        validated: validated_scores.len() as u64,
        rejected,
        total_points_distributed: validated_scores
            .iter()
            .map(|score| score.points_earned)
            .sum(),
    })
}

/// Run the conditional `pending -> resolved` update and disambiguate a miss
/// into `NotFound` (unknown id) or `InvalidState` (already resolved).
async fn resolve_pending(
    state: &SharedState,
    score_id: Uuid,
    resolution: ScoreResolution,
) -> Result<ScoreEntity, ServiceError> {
    let store = state.require_contest_store().await?;

    match store.resolve_score_if_pending(score_id, resolution).await? {
        Some(score) => Ok(score),
        None => match store.find_score(score_id).await? {
            Some(_) => Err(ServiceError::InvalidState(
                "this score has already been resolved".into(),
            )),
            None => Err(ServiceError::NotFound(format!(
                "score `{score_id}` not found"
            ))),
        },
    }
}
