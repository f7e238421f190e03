//! Topology summary, per-line views and the raw CFX batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use linewatch_core::MachineEntry;
use linewatch_events::{Alert, CfxMessage};
use serde::{Deserialize, Serialize};

use crate::http::errors::ApiError;
use crate::state::ApiState;

/// One line of `GET /api/lines`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineSummary {
    /// Line id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Machine names in configuration order.
    pub machines: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn cfx_data(State(state): State<Arc<ApiState>>) -> Json<Vec<CfxMessage>> {
    Json(state.buffer.snapshot())
}

pub(crate) async fn list_lines(State(state): State<Arc<ApiState>>) -> Json<Vec<LineSummary>> {
    let lines = state
        .monitor
        .lines()
        .into_iter()
        .map(|line| LineSummary {
            machines: line.machine_names().map(str::to_string).collect(),
            id: line.id,
            name: line.name,
        })
        .collect();
    Json(lines)
}

pub(crate) async fn line_machines(
    State(state): State<Arc<ApiState>>,
    Path(line_id): Path<String>,
) -> Result<Json<BTreeMap<String, MachineEntry>>, ApiError> {
    let entries = state
        .monitor
        .machine_states(&line_id)
        .ok_or_else(|| unknown_line(&line_id))?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect(),
    ))
}

pub(crate) async fn line_events(
    State(state): State<Arc<ApiState>>,
    Path(line_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<CfxMessage>>, ApiError> {
    let mut events = state
        .monitor
        .events(&line_id)
        .ok_or_else(|| unknown_line(&line_id))?;
    if let Some(limit) = query.limit {
        events.truncate(limit);
    }
    Ok(Json(events))
}

pub(crate) async fn line_alerts(
    State(state): State<Arc<ApiState>>,
    Path(line_id): Path<String>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    state
        .monitor
        .alerts(&line_id)
        .map(Json)
        .ok_or_else(|| unknown_line(&line_id))
}

fn unknown_line(line_id: &str) -> ApiError {
    ApiError::not_found(format!("line '{line_id}' is not configured"))
}
