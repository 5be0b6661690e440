use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB contest store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the ping during initial connection.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of pings sent before giving up.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: MongoError,
    },
    /// A ping issued by the health probe failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed for a collection.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection carrying the index.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The unique (team, challenge) index rejected a second submission.
    #[error("score for team `{team_id}` and challenge `{challenge_id}` already exists")]
    DuplicateScore {
        /// Submitting team.
        team_id: Uuid,
        /// Claimed challenge.
        challenge_id: Uuid,
    },
    /// A score insert failed for a reason other than the unique index.
    #[error("failed to insert score `{id}`")]
    InsertScore {
        /// Score identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score lookup failed.
    #[error("failed to load score `{id}`")]
    LoadScore {
        /// Score identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score listing query failed.
    #[error("failed to list scores")]
    ListScores {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score update (conditional resolve) failed.
    #[error("failed to update score `{id}`")]
    UpdateScore {
        /// Score identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score removal failed.
    #[error("failed to delete score `{id}`")]
    DeleteScore {
        /// Score identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score count query failed.
    #[error("failed to count scores")]
    CountScores {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A team lookup failed.
    #[error("failed to load team `{id}`")]
    LoadTeam {
        /// Team identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A team update (credit, debit, or badge addition) failed.
    #[error("failed to update team `{id}`")]
    UpdateTeam {
        /// Team identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A team listing query failed.
    #[error("failed to list teams")]
    ListTeams {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A team count query failed.
    #[error("failed to count teams")]
    CountTeams {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A challenge lookup failed.
    #[error("failed to load challenge `{id}`")]
    LoadChallenge {
        /// Challenge identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
