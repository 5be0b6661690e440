use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Gateway principal extraction.
pub mod auth;
/// Health check payloads.
pub mod health;
/// Leaderboard and rank payloads.
pub mod leaderboard;
/// Score lifecycle request/response payloads.
pub mod score;
/// Server-sent event payloads.
pub mod sse;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
