//! Backend-agnostic entity definitions shared by every storage implementation.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a score submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// Submitted, awaiting an administrator decision.
    Pending,
    /// Accepted; points have been credited to the team.
    Validated,
    /// Refused with a mandatory explanation note.
    Rejected,
}

impl ScoreStatus {
    /// Stable string form used in storage filters and event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Pending => "pending",
            ScoreStatus::Validated => "validated",
            ScoreStatus::Rejected => "rejected",
        }
    }
}

/// Category of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Main track challenge worth the big points.
    Principal,
    /// Side challenge with a smaller reward.
    Mini,
}

/// Achievement tag attached to a team by the badge evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// First validated score for the team.
    FirstChallenge,
    /// Reserved for a future submission-speed rule.
    SpeedDemon,
    /// Reserved for a future collaboration rule.
    TeamPlayer,
    /// Reserved for a future all-validated rule.
    Perfectionist,
    /// Reserved for a future contest-winner rule.
    Champion,
}

impl Badge {
    /// Stable string form used by the storage layer's set operations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::FirstChallenge => "first_challenge",
            Badge::SpeedDemon => "speed_demon",
            Badge::TeamPlayer => "team_player",
            Badge::Perfectionist => "perfectionist",
            Badge::Champion => "champion",
        }
    }
}

/// A team competing in the contest. The `score` field is only ever mutated
/// through the aggregator's atomic credit/debit operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEntity {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Display token for the team logo.
    pub logo: String,
    /// Owning leader; always present in `members`.
    pub leader_id: Uuid,
    /// User references, leader included.
    pub members: Vec<Uuid>,
    /// Cumulative validated points, non-negative.
    pub score: i64,
    /// Achievement tags, set semantics (no duplicates).
    pub badges: Vec<Badge>,
    /// Creation instant.
    pub created_at: SystemTime,
}

/// A challenge teams attempt. Point value and deadline are the read-only
/// inputs the lifecycle manager snapshots at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeEntity {
    /// Unique identifier.
    pub id: Uuid,
    /// Challenge title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Principal or mini track.
    pub kind: ChallengeKind,
    /// Points awarded on validation; source of truth for `points_earned`.
    pub points: i64,
    /// Submission cutoff.
    pub deadline: SystemTime,
    /// Whether submissions are currently accepted.
    pub is_active: bool,
}

impl ChallengeEntity {
    /// True once the deadline has passed. Computed, never stored.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > self.deadline
    }

    /// True while the deadline is ahead but closer than `window`.
    pub fn is_urgent(&self, now: SystemTime, window: Duration) -> bool {
        match self.deadline.duration_since(now) {
            Ok(remaining) => !remaining.is_zero() && remaining < window,
            Err(_) => false,
        }
    }
}

/// A team's single submission for a challenge, the central record of the
/// validation state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntity {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning team.
    pub team_id: Uuid,
    /// Challenge the submission targets.
    pub challenge_id: Uuid,
    /// Point value snapshotted from the challenge at submission time.
    pub points_earned: i64,
    /// User who submitted.
    pub submitted_by: Uuid,
    /// Administrator who resolved the score, if any.
    pub validated_by: Option<Uuid>,
    /// Current lifecycle status.
    pub status: ScoreStatus,
    /// Free-form note attached by the submitter.
    pub submission_note: String,
    /// Note attached by the resolving administrator.
    pub validation_note: String,
    /// Submission instant.
    pub submitted_at: SystemTime,
    /// Resolution instant, if resolved.
    pub validated_at: Option<SystemTime>,
}

/// Filter applied when listing or counting scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreFilter {
    /// Restrict to a single status.
    pub status: Option<ScoreStatus>,
    /// Restrict to one team.
    pub team_id: Option<Uuid>,
    /// Restrict to one challenge.
    pub challenge_id: Option<Uuid>,
}

impl ScoreFilter {
    /// All pending scores, any team.
    pub fn pending() -> Self {
        Self {
            status: Some(ScoreStatus::Pending),
            ..Self::default()
        }
    }

    /// Every score belonging to `team_id`.
    pub fn for_team(team_id: Uuid) -> Self {
        Self {
            team_id: Some(team_id),
            ..Self::default()
        }
    }

    /// Validated scores belonging to `team_id`; drives the badge evaluator
    /// and the exactly-once crediting checks.
    pub fn validated_for_team(team_id: Uuid) -> Self {
        Self {
            status: Some(ScoreStatus::Validated),
            team_id: Some(team_id),
            ..Self::default()
        }
    }

    /// Scores restricted to a single status.
    pub fn with_status(status: ScoreStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether `score` matches every populated criterion.
    pub fn matches(&self, score: &ScoreEntity) -> bool {
        self.status.is_none_or(|status| score.status == status)
            && self.team_id.is_none_or(|team| score.team_id == team)
            && self
                .challenge_id
                .is_none_or(|challenge| score.challenge_id == challenge)
    }
}

/// Outcome applied by the conditional `pending -> resolved` update.
#[derive(Debug, Clone)]
pub struct ScoreResolution {
    /// Terminal status to install; `Validated` or `Rejected`.
    pub status: ScoreStatus,
    /// Administrator performing the resolution.
    pub validated_by: Uuid,
    /// Note recorded with the decision.
    pub validation_note: String,
    /// Resolution instant.
    pub validated_at: SystemTime,
}

impl ScoreResolution {
    /// Build a validation resolution stamped with the current time.
    pub fn validated(admin_id: Uuid, note: String) -> Self {
        Self {
            status: ScoreStatus::Validated,
            validated_by: admin_id,
            validation_note: note,
            validated_at: SystemTime::now(),
        }
    }

    /// Build a rejection resolution stamped with the current time.
    pub fn rejected(admin_id: Uuid, note: String) -> Self {
        Self {
            status: ScoreStatus::Rejected,
            validated_by: admin_id,
            validation_note: note,
            validated_at: SystemTime::now(),
        }
    }
}
