/// Badge rule evaluation after validations.
pub mod badge_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Event outbox and fan-out dispatcher.
pub mod events;
/// Health check service.
pub mod health_service;
/// Team score aggregation and rank queries.
pub mod leaderboard_service;
/// Score lifecycle state machine.
pub mod score_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision.
pub mod storage_supervisor;
