use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoChallengeDocument, MongoScoreDocument, MongoTeamDocument, doc_id, score_filter_doc,
        uuid_as_binary,
    },
};
use crate::dao::{
    contest_store::ContestStore,
    models::{
        Badge, ChallengeEntity, ScoreEntity, ScoreFilter, ScoreResolution, ScoreStatus, TeamEntity,
    },
    storage::StorageResult,
};

const SCORE_COLLECTION_NAME: &str = "scores";
const TEAM_COLLECTION_NAME: &str = "teams";
const CHALLENGE_COLLECTION_NAME: &str = "challenges";

/// MongoDB-backed contest store. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct MongoContestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.client.database(&self.config.database_name)
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoContestStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // The at-most-one-submission-per-pair invariant lives here, not in
        // application code: a near-simultaneous duplicate submit loses at
        // the index, never via check-then-insert.
        let scores = database.collection::<mongodb::bson::Document>(SCORE_COLLECTION_NAME);
        let pair_index = IndexModel::builder()
            .keys(doc! {"team_id": 1, "challenge_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_pair_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        scores
            .create_index(pair_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "team_id,challenge_id",
                source,
            })?;

        let status_index = IndexModel::builder()
            .keys(doc! {"status": 1, "submitted_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_status_idx".to_owned()))
                    .build(),
            )
            .build();
        scores
            .create_index(status_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "status,submitted_at",
                source,
            })?;

        let teams = database.collection::<mongodb::bson::Document>(TEAM_COLLECTION_NAME);
        let score_index = IndexModel::builder()
            .keys(doc! {"score": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("team_score_idx".to_owned()))
                    .build(),
            )
            .build();
        teams
            .create_index(score_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEAM_COLLECTION_NAME,
                index: "score",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn score_collection(&self) -> Collection<MongoScoreDocument> {
        self.database()
            .await
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        self.database()
            .await
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
    }

    async fn challenge_collection(&self) -> Collection<MongoChallengeDocument> {
        self.database()
            .await
            .collection::<MongoChallengeDocument>(CHALLENGE_COLLECTION_NAME)
    }

    async fn insert_score(&self, score: ScoreEntity) -> MongoResult<()> {
        let id = score.id;
        let team_id = score.team_id;
        let challenge_id = score.challenge_id;
        let document: MongoScoreDocument = score.into();

        self.score_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateScore {
                        team_id,
                        challenge_id,
                    }
                } else {
                    MongoDaoError::InsertScore { id, source }
                }
            })?;
        Ok(())
    }

    async fn find_score(&self, id: Uuid) -> MongoResult<Option<ScoreEntity>> {
        let document = self
            .score_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadScore { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_scores(&self, filter: ScoreFilter) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .score_collection()
            .await
            .find(score_filter_doc(&filter))
            .sort(doc! {"submitted_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn resolve_score_if_pending(
        &self,
        id: Uuid,
        resolution: ScoreResolution,
    ) -> MongoResult<Option<ScoreEntity>> {
        // Single conditional write: only a document still in `pending` can
        // match, so concurrent resolutions race at the database and exactly
        // one of them observes the transition.
        let filter = doc! {
            "_id": uuid_as_binary(id),
            "status": ScoreStatus::Pending.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": resolution.status.as_str(),
                "validated_by": uuid_as_binary(resolution.validated_by),
                "validation_note": resolution.validation_note,
                "validated_at": DateTime::from_system_time(resolution.validated_at),
            }
        };

        let updated = self
            .score_collection()
            .await
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateScore { id, source })?;

        Ok(updated.map(Into::into))
    }

    async fn delete_score(&self, id: Uuid) -> MongoResult<Option<ScoreEntity>> {
        // Remove-and-return in one server-side step; of two concurrent
        // deletes only one gets the document back.
        let removed = self
            .score_collection()
            .await
            .find_one_and_delete(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteScore { id, source })?;
        Ok(removed.map(Into::into))
    }

    async fn count_scores(&self, filter: ScoreFilter) -> MongoResult<u64> {
        self.score_collection()
            .await
            .count_documents(score_filter_doc(&filter))
            .await
            .map_err(|source| MongoDaoError::CountScores { source })
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .team_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTeam { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn credit_team(&self, id: Uuid, points: i64) -> MongoResult<Option<TeamEntity>> {
        // Additive atomic increment so concurrent credits for different
        // scores against the same team never lose an update.
        let updated = self
            .team_collection()
            .await
            .find_one_and_update(doc_id(id), doc! {"$inc": {"score": points}})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateTeam { id, source })?;
        Ok(updated.map(Into::into))
    }

    async fn debit_team(&self, id: Uuid, points: i64) -> MongoResult<Option<TeamEntity>> {
        // Pipeline update so the subtraction and the zero clamp apply in one
        // atomic server-side step.
        let pipeline = UpdateModifications::Pipeline(vec![doc! {
            "$set": {
                "score": {"$max": [0, {"$subtract": ["$score", points]}]}
            }
        }]);
        let updated = self
            .team_collection()
            .await
            .find_one_and_update(doc_id(id), pipeline)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateTeam { id, source })?;
        Ok(updated.map(Into::into))
    }

    async fn add_badge(&self, id: Uuid, badge: Badge) -> MongoResult<bool> {
        let result = self
            .team_collection()
            .await
            .update_one(
                doc_id(id),
                doc! {"$addToSet": {"badges": badge.as_str()}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateTeam { id, source })?;
        Ok(result.modified_count > 0)
    }

    async fn list_teams_by_score(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .team_collection()
            .await
            .find(doc! {})
            .sort(doc! {"score": -1, "name": 1})
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn count_teams_above(&self, score: i64) -> MongoResult<u64> {
        self.team_collection()
            .await
            .count_documents(doc! {"score": {"$gt": score}})
            .await
            .map_err(|source| MongoDaoError::CountTeams { source })
    }

    async fn find_challenge(&self, id: Uuid) -> MongoResult<Option<ChallengeEntity>> {
        let document = self
            .challenge_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadChallenge { id, source })?;
        Ok(document.map(Into::into))
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

impl ContestStore for MongoContestStore {
    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_score(score).await.map_err(Into::into) })
    }

    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_score(id).await.map_err(Into::into) })
    }

    fn list_scores(
        &self,
        filter: ScoreFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores(filter).await.map_err(Into::into) })
    }

    fn resolve_score_if_pending(
        &self,
        id: Uuid,
        resolution: ScoreResolution,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .resolve_score_if_pending(id, resolution)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_score(id).await.map_err(Into::into) })
    }

    fn count_scores(&self, filter: ScoreFilter) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.count_scores(filter).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn credit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.credit_team(id, points).await.map_err(Into::into) })
    }

    fn debit_team(
        &self,
        id: Uuid,
        points: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.debit_team(id, points).await.map_err(Into::into) })
    }

    fn add_badge(&self, id: Uuid, badge: Badge) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.add_badge(id, badge).await.map_err(Into::into) })
    }

    fn list_teams_by_score(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams_by_score().await.map_err(Into::into) })
    }

    fn count_teams_above(&self, score: i64) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.count_teams_above(score).await.map_err(Into::into) })
    }

    fn find_challenge(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ChallengeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_challenge(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
