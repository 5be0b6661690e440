//! Team score aggregation: atomic credit/debit pass-throughs and on-demand
//! rank queries. Ranks are never cached; they depend on the whole team
//! population and are cheap to recompute per request.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    dao::{contest_store::ContestStore, models::TeamEntity},
    dto::leaderboard::{LeaderboardEntry, LeaderboardResponse, TeamRankResponse},
    error::ServiceError,
    state::SharedState,
};

/// Atomically add `points` to a team's cumulative score.
///
/// The increment happens at the storage layer so concurrent credits for
/// different scores against the same team cannot lose an update.
pub async fn credit(
    store: &Arc<dyn ContestStore>,
    team_id: Uuid,
    points: i64,
) -> Result<TeamEntity, ServiceError> {
    store
        .credit_team(team_id, points)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

/// Atomically subtract `points` from a team's score, clamped at zero so the
/// non-negative invariant survives compensating debits.
pub async fn debit(
    store: &Arc<dyn ContestStore>,
    team_id: Uuid,
    points: i64,
) -> Result<TeamEntity, ServiceError> {
    store
        .debit_team(team_id, points)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

/// Snapshot the full leaderboard, best teams first, with tie-aware ranks.
pub async fn leaderboard(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_contest_store().await?;
    let teams = store.list_teams_by_score().await?;
    Ok(LeaderboardResponse {
        entries: assign_ranks(teams),
    })
}

/// Standing of a single team: 1 + the number of strictly higher scores.
pub async fn team_rank(
    state: &SharedState,
    team_id: Uuid,
) -> Result<TeamRankResponse, ServiceError> {
    let store = state.require_contest_store().await?;
    let team = store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;
    let ahead = store.count_teams_above(team.score).await?;

    Ok(TeamRankResponse {
        team_id: team.id,
        score: team.score,
        rank: ahead + 1,
    })
}

/// Walk a score-descending team list and attach ranks. Tied teams share the
/// rank of the first team at that score ("how many teams are ahead of me"),
/// not a dense enumeration.
fn assign_ranks(teams: Vec<TeamEntity>) -> Vec<LeaderboardEntry> {
    let mut entries = Vec::with_capacity(teams.len());
    let mut previous_score: Option<i64> = None;
    let mut current_rank: u64 = 0;

    for (position, team) in teams.into_iter().enumerate() {
        if previous_score != Some(team.score) {
            current_rank = position as u64 + 1;
            previous_score = Some(team.score);
        }
        entries.push(LeaderboardEntry::new(team, current_rank));
    }

    entries
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn team(name: &str, score: i64) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            logo: String::new(),
            leader_id: Uuid::new_v4(),
            members: vec![],
            score,
            badges: vec![],
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn ties_share_a_rank_and_skip_positions() {
        let entries = assign_ranks(vec![
            team("alpha", 500),
            team("bravo", 500),
            team("charlie", 300),
            team("delta", 0),
        ]);

        let ranks: Vec<u64> = entries.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
    }

    #[test]
    fn empty_population_yields_no_entries() {
        assert!(assign_ranks(vec![]).is_empty());
    }

    #[test]
    fn all_tied_teams_rank_first() {
        let entries = assign_ranks(vec![team("alpha", 0), team("bravo", 0)]);
        assert!(entries.iter().all(|entry| entry.rank == 1));
    }
}
