use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check endpoint.
pub mod health;
/// Public leaderboard endpoints.
pub mod leaderboard;
/// Score lifecycle endpoints.
pub mod scores;
/// Realtime event streams.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(scores::router())
        .merge(leaderboard::router())
        .merge(sse::router());

    let docs_router = docs::router();

    api_router.merge(docs_router).with_state(state)
}
