//! Library crate for podium-back, exposing modules for the binary and
//! integration tests.

/// Runtime configuration loading.
pub mod config;
/// Storage trait, entities, and backend implementations.
pub mod dao;
/// Request/response payloads and the gateway principal.
pub mod dto;
/// Service and HTTP error taxonomies.
pub mod error;
/// HTTP routers and handlers.
pub mod routes;
/// Business services, background tasks, and API documentation.
pub mod services;
/// Shared application state and broadcast hubs.
pub mod state;
