//! Request and response payloads for the score lifecycle endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{ScoreEntity, ScoreFilter, ScoreStatus};
use crate::dto::format_system_time;

/// Longest accepted submission or validation note.
pub const MAX_NOTE_LENGTH: u64 = 500;

/// Payload submitted by a team member claiming a challenge.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitScoreRequest {
    /// Challenge being claimed.
    pub challenge_id: Uuid,
    /// Optional evidence note.
    #[validate(length(max = 500, message = "note cannot exceed 500 characters"))]
    #[serde(default)]
    pub note: Option<String>,
}

/// Payload for validating a pending score.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateScoreRequest {
    /// Optional note recorded with the validation.
    #[validate(length(max = 500, message = "note cannot exceed 500 characters"))]
    #[serde(default)]
    pub note: Option<String>,
}

/// Payload for rejecting a pending score. The note is mandatory; blank
/// notes are refused by the lifecycle manager.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectScoreRequest {
    /// Reason for the rejection, surfaced to the team.
    #[validate(length(min = 1, max = 500, message = "a rejection note is required"))]
    pub note: String,
}

/// Optional filters accepted by the admin score listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ScoreListQuery {
    /// Restrict to a single status.
    pub status: Option<ScoreStatus>,
    /// Restrict to one team.
    pub team_id: Option<Uuid>,
    /// Restrict to one challenge.
    pub challenge_id: Option<Uuid>,
}

impl From<ScoreListQuery> for ScoreFilter {
    fn from(value: ScoreListQuery) -> Self {
        Self {
            status: value.status,
            team_id: value.team_id,
            challenge_id: value.challenge_id,
        }
    }
}

/// A score as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    /// Score identifier.
    pub id: Uuid,
    /// Owning team.
    pub team_id: Uuid,
    /// Challenge the submission targets.
    pub challenge_id: Uuid,
    /// Points snapshotted at submission time.
    pub points_earned: i64,
    /// Submitting user.
    pub submitted_by: Uuid,
    /// Resolving administrator, if resolved.
    pub validated_by: Option<Uuid>,
    /// Current status.
    pub status: ScoreStatus,
    /// Note attached by the submitter.
    pub submission_note: String,
    /// Note attached by the administrator.
    pub validation_note: String,
    /// RFC 3339 submission timestamp.
    pub submitted_at: String,
    /// RFC 3339 resolution timestamp, if resolved.
    pub validated_at: Option<String>,
}

impl From<ScoreEntity> for ScoreResponse {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.id,
            team_id: value.team_id,
            challenge_id: value.challenge_id,
            points_earned: value.points_earned,
            submitted_by: value.submitted_by,
            validated_by: value.validated_by,
            status: value.status,
            submission_note: value.submission_note,
            validation_note: value.validation_note,
            submitted_at: format_system_time(value.submitted_at),
            validated_at: value.validated_at.map(format_system_time),
        }
    }
}

/// Listing wrapper carrying the result count.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreListResponse {
    /// Matching scores, newest first.
    pub scores: Vec<ScoreResponse>,
    /// Number of matching scores.
    pub total: usize,
}

impl From<Vec<ScoreEntity>> for ScoreListResponse {
    fn from(value: Vec<ScoreEntity>) -> Self {
        let scores: Vec<ScoreResponse> = value.into_iter().map(Into::into).collect();
        let total = scores.len();
        Self { scores, total }
    }
}

/// Aggregate counters over one team's submissions.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamScoreStats {
    /// All submissions, any status.
    pub total: usize,
    /// Validated submissions.
    pub validated: usize,
    /// Pending submissions.
    pub pending: usize,
    /// Rejected submissions.
    pub rejected: usize,
    /// Sum of `points_earned` over validated submissions.
    pub total_points: i64,
}

/// A team's submissions together with aggregate counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamScoresResponse {
    /// Submissions for the team, newest first.
    pub scores: Vec<ScoreResponse>,
    /// Aggregates derived from `scores`.
    pub stats: TeamScoreStats,
}

impl From<Vec<ScoreEntity>> for TeamScoresResponse {
    fn from(value: Vec<ScoreEntity>) -> Self {
        let stats = TeamScoreStats {
            total: value.len(),
            validated: count_with(&value, ScoreStatus::Validated),
            pending: count_with(&value, ScoreStatus::Pending),
            rejected: count_with(&value, ScoreStatus::Rejected),
            total_points: value
                .iter()
                .filter(|score| score.status == ScoreStatus::Validated)
                .map(|score| score.points_earned)
                .sum(),
        };
        Self {
            scores: value.into_iter().map(Into::into).collect(),
            stats,
        }
    }
}

fn count_with(scores: &[ScoreEntity], status: ScoreStatus) -> usize {
    scores.iter().filter(|score| score.status == status).count()
}

/// Contest-wide score statistics for administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreStatsResponse {
    /// All submissions ever made.
    pub total: u64,
    /// Pending submissions awaiting a decision.
    pub pending: u64,
    /// Validated submissions.
    pub validated: u64,
    /// Rejected submissions.
    pub rejected: u64,
    /// Sum of points credited through validated submissions.
    pub total_points_distributed: i64,
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn score(status: ScoreStatus, points: i64) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            challenge_id: Uuid::new_v4(),
            points_earned: points,
            submitted_by: Uuid::new_v4(),
            validated_by: None,
            status,
            submission_note: String::new(),
            validation_note: String::new(),
            submitted_at: SystemTime::now(),
            validated_at: None,
        }
    }

    #[test]
    fn team_stats_only_count_validated_points() {
        let response: TeamScoresResponse = vec![
            score(ScoreStatus::Validated, 500),
            score(ScoreStatus::Validated, 100),
            score(ScoreStatus::Pending, 250),
            score(ScoreStatus::Rejected, 50),
        ]
        .into();

        assert_eq!(response.stats.total, 4);
        assert_eq!(response.stats.validated, 2);
        assert_eq!(response.stats.pending, 1);
        assert_eq!(response.stats.rejected, 1);
        assert_eq!(response.stats.total_points, 600);
    }

    #[test]
    fn reject_note_must_not_be_empty() {
        let blank = RejectScoreRequest { note: String::new() };
        assert!(blank.validate().is_err());

        let ok = RejectScoreRequest {
            note: "insufficient evidence".into(),
        };
        assert!(ok.validate().is_ok());
    }
}
