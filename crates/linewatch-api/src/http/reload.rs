//! Reload trigger.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use linewatch_core::{MonitorError, ReloadOutcome};
use serde::Deserialize;
use tracing::warn;

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReloadQuery {
    #[serde(default)]
    pub(crate) reset: bool,
}

pub(crate) async fn reload(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ReloadQuery>,
) -> Result<Json<ReloadOutcome>, ApiError> {
    state.monitor.reload(query.reset).await.map(Json).map_err(|err| {
        warn!(error = %err, reset = query.reset, "reload failed");
        match err {
            MonitorError::Fetch { source } => {
                ApiError::service_unavailable(format!("batch fetch failed: {source}"))
            }
            MonitorError::FetchTimeout { timeout_ms } => ApiError::service_unavailable(format!(
                "batch fetch timed out after {timeout_ms} ms"
            )),
        }
    })
}
