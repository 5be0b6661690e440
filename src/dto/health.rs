use serde::Serialize;
use utoipa::ToSchema;

/// Overall service condition reported by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCondition {
    /// Storage is installed and the service is fully operational.
    Ok,
    /// Running without a storage backend; lifecycle operations answer 503.
    Degraded,
}

/// Payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall condition.
    pub status: ServiceCondition,
    /// Whether a storage backend is currently installed.
    pub storage_connected: bool,
}

impl HealthResponse {
    /// Derive the payload from the degraded flag.
    pub fn from_degraded(degraded: bool) -> Self {
        Self {
            status: if degraded {
                ServiceCondition::Degraded
            } else {
                ServiceCondition::Ok
            },
            storage_connected: !degraded,
        }
    }
}
