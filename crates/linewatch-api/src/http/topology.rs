//! Topology replacement and collision warnings.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use linewatch_config::{ConfigError, LineConfig, NameCollision, Topology};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http::errors::{ApiError, ProblemInvalidParam};
use crate::state::ApiState;

/// Response of `PUT /api/topology`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyResponse {
    /// Number of installed lines.
    pub lines: usize,
    /// Machine names claimed by more than one line.
    pub warnings: Vec<NameCollision>,
}

pub(crate) async fn put_topology(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Vec<LineConfig>>, JsonRejection>,
) -> Result<Json<TopologyResponse>, ApiError> {
    let Json(lines) =
        payload.map_err(|rejection| ApiError::topology_invalid(rejection.body_text()))?;
    let topology = Topology::new(lines).map_err(|err| {
        warn!(error = %err, "rejected topology update");
        topology_problem(&err)
    })?;
    let count = topology.lines.len();
    let warnings = state.monitor.apply_topology(topology);
    info!(lines = count, warnings = warnings.len(), "topology replaced over HTTP");
    Ok(Json(TopologyResponse {
        lines: count,
        warnings,
    }))
}

pub(crate) async fn topology_warnings(
    State(state): State<Arc<ApiState>>,
) -> Json<Vec<NameCollision>> {
    Json(state.monitor.collisions())
}

fn topology_problem(err: &ConfigError) -> ApiError {
    match err {
        ConfigError::InvalidTopology {
            line,
            field,
            reason,
        } => ApiError::topology_invalid("topology failed validation").with_invalid_params(vec![
            ProblemInvalidParam {
                pointer: format!("/{field}"),
                message: format!("line {line}: {reason}"),
            },
        ]),
        other => ApiError::topology_invalid(other.to_string()),
    }
}
