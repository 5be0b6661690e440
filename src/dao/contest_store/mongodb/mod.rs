//! MongoDB backend for the contest store.

/// Connection options derived from the environment or a raw URI.
pub mod config;
mod connection;
mod error;
mod models;
/// MongoDB-backed [`ContestStore`](crate::dao::contest_store::ContestStore)
/// implementation.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoContestStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateScore {
                team_id,
                challenge_id,
            } => StorageError::duplicate(format!(
                "score for team `{team_id}` and challenge `{challenge_id}` already exists"
            )),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
