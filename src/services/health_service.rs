use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Assemble the health snapshot, probing storage along the way.
///
/// A missing or unresponsive storage backend reports the service as
/// degraded; the judge field only states which primary provider is wired in,
/// since the fallback keeps judging available either way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        None => {
            warn!("storage unavailable (degraded mode)");
            false
        }
    };

    HealthResponse {
        status: if storage { "ok" } else { "degraded" }.into(),
        storage,
        judge: state
            .primary_judge()
            .map(|judge| judge.name().to_string()),
    }
}
