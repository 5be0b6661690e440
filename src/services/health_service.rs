use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health payload from the degraded flag, probing the backend so
/// connectivity problems surface in the logs before the supervisor notices.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Some(store) = state.contest_store().await {
        if let Err(err) = store.health_check().await {
            warn!(error = %err, "storage health probe failed");
        }
    } else {
        warn!("no storage backend installed; reporting degraded");
    }

    HealthResponse::from_degraded(state.is_degraded().await)
}
