//! Shared HTTP constants (headers, problem URIs, stream settings).

pub(crate) const HEADER_LAST_EVENT_ID: &str = "last-event-id";
pub(crate) const SSE_KEEP_ALIVE_SECS: u64 = 20;

pub(crate) const PROBLEM_INTERNAL: &str = "https://linewatch.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://linewatch.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://linewatch.dev/problems/not-found";
pub(crate) const PROBLEM_TOPOLOGY_INVALID: &str =
    "https://linewatch.dev/problems/topology-invalid";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://linewatch.dev/problems/service-unavailable";

pub(crate) const EVENT_KIND_WHITELIST: &[&str] = &[
    "status_changed",
    "alert_raised",
    "batch_applied",
    "session_reset",
    "topology_changed",
    "health_changed",
];
