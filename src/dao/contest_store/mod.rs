//! Persistence seam for contest entities. Every invariant-bearing mutation
//! (unique score insert, conditional resolve, credit/debit) is a single
//! storage-level operation so concurrent request handlers cannot interleave
//! a read-modify-write.

#[cfg(feature = "memory-store")]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    Badge, ChallengeEntity, ScoreEntity, ScoreFilter, ScoreResolution, TeamEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for scores, teams, and challenges.
pub trait ContestStore: Send + Sync {
    /// Insert a new score, guarded by the unique (team, challenge) index.
    /// A second submission for the same pair fails with
    /// [`StorageError::Duplicate`](crate::dao::storage::StorageError).
    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a single score by id.
    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// List scores matching `filter`, newest submission first.
    fn list_scores(&self, filter: ScoreFilter)
    -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Conditionally move a score from `pending` to the resolved status in a
    /// single compare-and-swap write. Returns the updated score, or `None`
    /// when no pending score with that id exists, either because the id is
    /// unknown or because the score was already resolved; the caller
    /// disambiguates with [`Self::find_score`].
    fn resolve_score_if_pending(
        &self,
        id: Uuid,
        resolution: ScoreResolution,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// Remove a score record in a single atomic step, returning the removed
    /// document. Concurrent deletes race at the storage layer and exactly
    /// one caller observes the score, so a compensating debit for a
    /// validated score can never run twice.
    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// Count scores matching `filter`.
    fn count_scores(&self, filter: ScoreFilter) -> BoxFuture<'static, StorageResult<u64>>;

    /// Look up a single team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Atomically add `points` to a team's score and return the updated team.
    fn credit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Atomically subtract `points` from a team's score, clamped at zero,
    /// and return the updated team.
    fn debit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Add a badge to a team's badge set. Adding an already-present badge is
    /// a no-op; returns whether the set changed.
    fn add_badge(&self, id: Uuid, badge: Badge) -> BoxFuture<'static, StorageResult<bool>>;
    /// All teams ordered by score descending (name ascending for stability).
    fn list_teams_by_score(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Number of teams whose score is strictly greater than `score`.
    fn count_teams_above(&self, score: i64) -> BoxFuture<'static, StorageResult<u64>>;

    /// Read-only challenge lookup used at submission time.
    fn find_challenge(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ChallengeEntity>>>;

    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish the backend connection after a failed probe.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
