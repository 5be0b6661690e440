//! Public leaderboard and rank payloads.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{Badge, TeamEntity};

/// One row of the public leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Team identifier.
    pub team_id: Uuid,
    /// Team display name.
    pub name: String,
    /// Team logo token.
    pub logo: String,
    /// Current cumulative score.
    pub score: i64,
    /// Rank: 1 + number of teams with a strictly greater score. Tied teams
    /// share the same rank value.
    pub rank: u64,
    /// Achievement badges.
    pub badges: Vec<Badge>,
}

impl LeaderboardEntry {
    /// Build an entry from a team and its computed rank.
    pub fn new(team: TeamEntity, rank: u64) -> Self {
        Self {
            team_id: team.id,
            name: team.name,
            logo: team.logo,
            score: team.score,
            rank,
            badges: team.badges,
        }
    }
}

/// Full leaderboard snapshot, best teams first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked teams, score descending.
    pub entries: Vec<LeaderboardEntry>,
}

/// Standing of a single team.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamRankResponse {
    /// Team identifier.
    pub team_id: Uuid,
    /// Current cumulative score.
    pub score: i64,
    /// Rank, ties sharing the same value.
    pub rank: u64,
}
