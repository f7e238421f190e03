//! Request counter for the HTTP surface.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::ApiState;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Count each request under its route template, method and status code.
///
/// Per-line views are labelled by template (`/api/lines/{id}/machines`), so the
/// series count stays bounded however many lines the topology holds.
pub(crate) async fn track_requests(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_string();
    let method = request.method().clone();

    let response = next.run(request).await;
    state
        .telemetry
        .inc_http_request(&route, method.as_str(), response.status().as_u16());
    response
}
