//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::{get, post, put},
};
use linewatch_telemetry::{REQUEST_ID_HEADER, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::HEADER_LAST_EVENT_ID;
use crate::http::health::{health, metrics};
use crate::http::lines::{cfx_data, line_alerts, line_events, line_machines, list_lines};
use crate::http::reload::reload;
use crate::http::sse::stream_events;
use crate::http::telemetry::track_requests;
use crate::http::topology::{put_topology, topology_warnings};
use crate::state::{ApiDeps, ApiState};

/// Axum router wrapper that hosts the monitor API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct the API with shared dependencies wired through application state.
    #[must_use]
    pub fn new(deps: ApiDeps) -> Self {
        let state = Arc::new(ApiState::new(deps));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_LAST_EVENT_ID)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(linewatch_telemetry::propagate_request_id_layer())
            .layer(linewatch_telemetry::set_request_id_layer())
            .layer(trace_layer);

        let router = Self::routes()
            .layer(cors_layer)
            .route_layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                track_requests,
            ))
            .route_layer(layered)
            .with_state(state);
        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/api/health", get(health))
            .route("/metrics", get(metrics))
            .route("/api/cfx-data", get(cfx_data))
            .route("/api/lines", get(list_lines))
            .route("/api/lines/{id}/machines", get(line_machines))
            .route("/api/lines/{id}/events", get(line_events))
            .route("/api/lines/{id}/alerts", get(line_alerts))
            .route("/api/topology", put(put_topology))
            .route("/api/topology/warnings", get(topology_warnings))
            .route("/api/reload", post(reload))
            .route("/api/stream", get(stream_events))
    }

    /// Router with state and layers applied.
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Bind and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] when the listener cannot bind and
    /// [`ApiServerError::Serve`] when serving fails.
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        tracing::info!(%addr, "starting API");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use linewatch_config::sample_topology;
    use linewatch_core::{HealthTracker, MonitorDeps, MonitorService, SessionLimits};
    use linewatch_events::EventBus;
    use linewatch_ingest::MessageBuffer;
    use linewatch_telemetry::Metrics;
    use linewatch_test_support::fixtures::two_lines;
    use linewatch_test_support::messages::{fault, state_changed};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    type TestResult = Result<(), Box<dyn Error>>;

    fn server() -> Result<(ApiServer, MessageBuffer), Box<dyn Error>> {
        let events = EventBus::with_capacity(64);
        let metrics = Metrics::new()?;
        let health = HealthTracker::new(events.clone());
        let buffer = MessageBuffer::new(100);
        let monitor = MonitorService::new(
            two_lines(),
            SessionLimits::default(),
            Duration::from_secs(1),
            MonitorDeps {
                source: Arc::new(buffer.clone()),
                events,
                metrics: metrics.clone(),
                health: health.clone(),
            },
        );
        let server = ApiServer::new(ApiDeps {
            monitor,
            buffer: buffer.clone(),
            metrics,
            health,
        });
        Ok((server, buffer))
    }

    async fn send(
        server: &ApiServer,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), Box<dyn Error>> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        let response = server.router().clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    #[tokio::test]
    async fn health_reports_ok_and_request_id() -> TestResult {
        let (server, _) = server()?;
        let response = server
            .router()
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body: Value =
            serde_json::from_slice(&response.into_body().collect().await?.to_bytes())?;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["degraded"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn reload_then_read_line_views() -> TestResult {
        let (server, buffer) = server()?;
        buffer.extend([
            state_changed("u1", "SPI", "1200"),
            fault("u2", "Reflow", "E201"),
        ]);

        let (status, outcome) = send(&server, Method::POST, "/api/reload", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "applied");
        assert_eq!(outcome["applied"], 2);

        let (_, machines) = send(&server, Method::GET, "/api/lines/line-A/machines", None).await?;
        assert_eq!(machines["SPI"]["status"], "Running");
        assert_eq!(machines["Reflow"]["status"], "Unknown");
        assert_eq!(machines["SPI"]["efficiency"], 0.0);

        let (_, events) = send(&server, Method::GET, "/api/lines/line-A/events?limit=1", None).await?;
        assert_eq!(events.as_array().map(Vec::len), Some(1));
        assert_eq!(events[0]["UniqueID"], "u2");

        let (_, alerts) = send(&server, Method::GET, "/api/lines/line-A/alerts", None).await?;
        assert_eq!(alerts[0]["type"], "error");
        assert_eq!(alerts[0]["message"], "Fault on Reflow: E201");

        let (_, batch) = send(&server, Method::GET, "/api/cfx-data", None).await?;
        assert_eq!(batch.as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_line_is_a_problem_document() -> TestResult {
        let (server, _) = server()?;
        let (status, body) = send(&server, Method::GET, "/api/lines/nope/machines", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["type"], "https://linewatch.dev/problems/not-found");
        Ok(())
    }

    #[tokio::test]
    async fn topology_replacement_reports_collisions() -> TestResult {
        let (server, _) = server()?;
        let lines = serde_json::to_value(sample_topology())?;
        let (status, body) = send(&server, Method::PUT, "/api/topology", Some(lines)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"], 2);
        assert_eq!(body["warnings"].as_array().map(Vec::len), Some(4));

        let (_, warnings) = send(&server, Method::GET, "/api/topology/warnings", None).await?;
        assert_eq!(warnings[0]["winning_line"], "line-b");

        let (_, summary) = send(&server, Method::GET, "/api/lines", None).await?;
        assert_eq!(summary[0]["id"], "line-a");
        assert_eq!(summary[0]["machines"].as_array().map(Vec::len), Some(4));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_topology_is_unprocessable() -> TestResult {
        let (server, _) = server()?;
        let body = json!([{ "id": "", "name": "Broken", "machines": [] }]);
        let (status, problem) = send(&server, Method::PUT, "/api/topology", Some(body)).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(problem["title"], "topology invalid");
        assert!(problem["invalid_params"].is_array());

        let (status, _) =
            send(&server, Method::PUT, "/api/topology", Some(json!({"not": "a list"}))).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn reload_with_reset_clears_previous_state() -> TestResult {
        let (server, buffer) = server()?;
        buffer.push(state_changed("u1", "SPI", "1200"));
        send(&server, Method::POST, "/api/reload", None).await?;
        buffer.clear();

        let (status, outcome) = send(&server, Method::POST, "/api/reload?reset=true", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["applied"], 0);
        let (_, machines) = send(&server, Method::GET, "/api/lines/line-A/machines", None).await?;
        assert_eq!(machines["SPI"]["status"], "Unknown");
        Ok(())
    }

    fn has_series(text: &str, labels: &[&str]) -> bool {
        text.lines().any(|line| {
            line.starts_with("http_requests_total{")
                && labels.iter().all(|label| line.contains(label))
        })
    }

    #[tokio::test]
    async fn metrics_count_line_views_by_template_method_and_status() -> TestResult {
        let (server, _) = server()?;
        send(&server, Method::GET, "/api/lines/line-A/alerts", None).await?;
        send(&server, Method::GET, "/api/lines/line-B/alerts", None).await?;
        send(&server, Method::GET, "/api/lines/nope/machines", None).await?;
        send(&server, Method::POST, "/api/reload", None).await?;

        let response = server
            .router()
            .clone()
            .oneshot(Request::get("/metrics").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(response.into_body().collect().await?.to_bytes().to_vec())?;

        assert!(has_series(
            &text,
            &[r#"route="/api/lines/{id}/alerts""#, r#"method="GET""#, r#"code="200""#, "} 2"]
        ));
        assert!(has_series(
            &text,
            &[r#"route="/api/lines/{id}/machines""#, r#"method="GET""#, r#"code="404""#]
        ));
        assert!(has_series(
            &text,
            &[r#"route="/api/reload""#, r#"method="POST""#, r#"code="200""#]
        ));
        assert!(!text.contains("line-A"));
        Ok(())
    }

    #[tokio::test]
    async fn stream_rejects_unknown_event_filters() -> TestResult {
        let (server, _) = server()?;
        let (status, _) = send(&server, Method::GET, "/api/stream?event=bogus", None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let response = server
            .router()
            .clone()
            .oneshot(Request::get("/api/stream?line=line-A").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
            Some(&b"text/event-stream"[..])
        );
        Ok(())
    }
}
