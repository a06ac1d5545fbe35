use serde::Serialize;
use utoipa::ToSchema;

/// Health snapshot returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, "ok" or "degraded".
    pub status: String,
    /// Whether a storage backend is installed and answering health probes.
    pub storage: bool,
    /// Name of the configured primary judge provider; absent when debates
    /// run on fallback verdicts alone.
    pub judge: Option<String>,
}
