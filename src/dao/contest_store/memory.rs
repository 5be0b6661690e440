//! In-memory [`ContestStore`] backend. Used by the integration tests and as
//! a throwaway backend for local demos; every mutation holds the relevant
//! map lock for its whole duration, giving the same atomicity guarantees the
//! MongoDB backend gets from single-document operations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    contest_store::ContestStore,
    models::{
        Badge, ChallengeEntity, ScoreEntity, ScoreFilter, ScoreResolution, ScoreStatus, TeamEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Shared in-memory backend; cloning is cheap and refers to the same data.
#[derive(Clone, Default)]
pub struct MemoryContestStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    scores: Mutex<HashMap<Uuid, ScoreEntity>>,
    teams: Mutex<HashMap<Uuid, TeamEntity>>,
    challenges: Mutex<HashMap<Uuid, ChallengeEntity>>,
}

impl MemoryContestStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a team record. Fixture helper for tests and demos; production
    /// team writes arrive through the external team directory.
    pub fn put_team(&self, team: TeamEntity) {
        self.inner
            .teams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(team.id, team);
    }

    /// Seed a challenge record. Fixture helper, see [`Self::put_team`].
    pub fn put_challenge(&self, challenge: ChallengeEntity) {
        self.inner
            .challenges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(challenge.id, challenge);
    }

    fn insert_score_sync(&self, score: ScoreEntity) -> StorageResult<()> {
        let mut scores = self
            .inner
            .scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Unique (team, challenge) constraint, checked under the lock so a
        // near-simultaneous submit cannot slip in between check and insert.
        let duplicate = scores
            .values()
            .any(|existing| existing.team_id == score.team_id && existing.challenge_id == score.challenge_id);
        if duplicate {
            return Err(StorageError::duplicate(format!(
                "score for team `{}` and challenge `{}` already exists",
                score.team_id, score.challenge_id
            )));
        }
        scores.insert(score.id, score);
        Ok(())
    }

    fn resolve_sync(&self, id: Uuid, resolution: ScoreResolution) -> Option<ScoreEntity> {
        let mut scores = self
            .inner
            .scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let score = scores.get_mut(&id)?;
        if score.status != ScoreStatus::Pending {
            return None;
        }
        score.status = resolution.status;
        score.validated_by = Some(resolution.validated_by);
        score.validation_note = resolution.validation_note;
        score.validated_at = Some(resolution.validated_at);
        Some(score.clone())
    }

    fn adjust_team_sync(&self, id: Uuid, delta: i64, clamp: bool) -> Option<TeamEntity> {
        let mut teams = self
            .inner
            .teams
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let team = teams.get_mut(&id)?;
        team.score += delta;
        if clamp && team.score < 0 {
            team.score = 0;
        }
        Some(team.clone())
    }
}

impl ContestStore for MemoryContestStore {
    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_score_sync(score) })
    }

    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let scores = store
                .inner
                .scores
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(scores.get(&id).cloned())
        })
    }

    fn list_scores(
        &self,
        filter: ScoreFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let scores = store
                .inner
                .scores
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut matching: Vec<ScoreEntity> = scores
                .values()
                .filter(|score| filter.matches(score))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
            Ok(matching)
        })
    }

    fn resolve_score_if_pending(
        &self,
        id: Uuid,
        resolution: ScoreResolution,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.resolve_sync(id, resolution)) })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores = store
                .inner
                .scores
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(scores.remove(&id))
        })
    }

    fn count_scores(&self, filter: ScoreFilter) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let scores = store
                .inner
                .scores
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(scores.values().filter(|score| filter.matches(score)).count() as u64)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let teams = store
                .inner
                .teams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(teams.get(&id).cloned())
        })
    }

    fn credit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.adjust_team_sync(id, points, false)) })
    }

    fn debit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.adjust_team_sync(id, -points, true)) })
    }

    fn add_badge(&self, id: Uuid, badge: Badge) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut teams = store
                .inner
                .teams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(team) = teams.get_mut(&id) else {
                return Ok(false);
            };
            if team.badges.contains(&badge) {
                return Ok(false);
            }
            team.badges.push(badge);
            Ok(true)
        })
    }

    fn list_teams_by_score(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let teams = store
                .inner
                .teams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut all: Vec<TeamEntity> = teams.values().cloned().collect();
            all.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
            Ok(all)
        })
    }

    fn count_teams_above(&self, score: i64) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let teams = store
                .inner
                .teams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(teams.values().filter(|team| team.score > score).count() as u64)
        })
    }

    fn find_challenge(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ChallengeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let challenges = store
                .inner
                .challenges
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(challenges.get(&id).cloned())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
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

    fn pending_score(team_id: Uuid, challenge_id: Uuid) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            team_id,
            challenge_id,
            points_earned: 100,
            submitted_by: Uuid::new_v4(),
            validated_by: None,
            status: ScoreStatus::Pending,
            submission_note: String::new(),
            validation_note: String::new(),
            submitted_at: SystemTime::now(),
            validated_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected_regardless_of_status() {
        let store = MemoryContestStore::new();
        let (team_id, challenge_id) = (Uuid::new_v4(), Uuid::new_v4());
        let first = pending_score(team_id, challenge_id);
        store.insert_score(first.clone()).await.unwrap();

        // Resolve the first submission; the pair must still be blocked.
        store
            .resolve_score_if_pending(
                first.id,
                ScoreResolution::rejected(Uuid::new_v4(), "nope".into()),
            )
            .await
            .unwrap()
            .unwrap();

        let err = store
            .insert_score(pending_score(team_id, challenge_id))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn resolve_is_single_shot() {
        let store = MemoryContestStore::new();
        let score = pending_score(Uuid::new_v4(), Uuid::new_v4());
        store.insert_score(score.clone()).await.unwrap();

        let admin = Uuid::new_v4();
        let resolved = store
            .resolve_score_if_pending(score.id, ScoreResolution::validated(admin, String::new()))
            .await
            .unwrap();
        assert_eq!(resolved.unwrap().status, ScoreStatus::Validated);

        let second = store
            .resolve_score_if_pending(score.id, ScoreResolution::validated(admin, String::new()))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn debit_clamps_at_zero() {
        let store = MemoryContestStore::new();
        let t = team("alpha", 30);
        store.put_team(t.clone());

        let updated = store.debit_team(t.id, 100).await.unwrap().unwrap();
        assert_eq!(updated.score, 0);
    }

    #[tokio::test]
    async fn badge_addition_is_idempotent() {
        let store = MemoryContestStore::new();
        let t = team("alpha", 0);
        store.put_team(t.clone());

        assert!(store.add_badge(t.id, Badge::FirstChallenge).await.unwrap());
        assert!(!store.add_badge(t.id, Badge::FirstChallenge).await.unwrap());

        let reloaded = store.find_team(t.id).await.unwrap().unwrap();
        assert_eq!(reloaded.badges, vec![Badge::FirstChallenge]);
    }
}
