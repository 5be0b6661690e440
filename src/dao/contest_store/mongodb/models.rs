use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    Badge, ChallengeEntity, ChallengeKind, ScoreEntity, ScoreFilter, ScoreStatus, TeamEntity,
};

/// Stored form of a score submission. The `(team_id, challenge_id)` pair
/// carries a unique index so at most one submission exists per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    team_id: Uuid,
    challenge_id: Uuid,
    points_earned: i64,
    submitted_by: Uuid,
    validated_by: Option<Uuid>,
    status: ScoreStatus,
    #[serde(default)]
    submission_note: String,
    #[serde(default)]
    validation_note: String,
    submitted_at: DateTime,
    validated_at: Option<DateTime>,
}

impl From<ScoreEntity> for MongoScoreDocument {
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
            submitted_at: DateTime::from_system_time(value.submitted_at),
            validated_at: value.validated_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
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
            submitted_at: value.submitted_at.to_system_time(),
            validated_at: value.validated_at.map(|at| at.to_system_time()),
        }
    }
}

/// Stored form of a team. The external team directory owns creation and
/// membership; this backend only reads teams and adjusts `score`/`badges`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    #[serde(default)]
    logo: String,
    leader_id: Uuid,
    #[serde(default)]
    members: Vec<Uuid>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    badges: Vec<Badge>,
    created_at: DateTime,
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            logo: value.logo,
            leader_id: value.leader_id,
            members: value.members,
            score: value.score,
            badges: value.badges,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Stored form of a challenge, maintained by the external challenge catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChallengeDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    #[serde(default)]
    description: String,
    kind: ChallengeKind,
    points: i64,
    deadline: DateTime,
    is_active: bool,
}

impl From<MongoChallengeDocument> for ChallengeEntity {
    fn from(value: MongoChallengeDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            kind: value.kind,
            points: value.points,
            deadline: value.deadline.to_system_time(),
            is_active: value.is_active,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Translate a [`ScoreFilter`] into a find/count filter document.
pub fn score_filter_doc(filter: &ScoreFilter) -> Document {
    let mut document = doc! {};
    if let Some(status) = filter.status {
        document.insert("status", status.as_str());
    }
    if let Some(team_id) = filter.team_id {
        document.insert("team_id", uuid_as_binary(team_id));
    }
    if let Some(challenge_id) = filter.challenge_id {
        document.insert("challenge_id", uuid_as_binary(challenge_id));
    }
    document
}
