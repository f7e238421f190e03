//! Process-level span shared by every record a linewatch binary emits.

use tracing::Span;

use crate::init::build_sha;

/// Root span for a linewatch process.
///
/// Instrument the top-level future with it; request spans opened below it
/// inherit the service name and build identifier.
#[must_use]
pub fn service_span(service: &str) -> Span {
    tracing::info_span!("service", service = %service, build_sha = %build_sha())
}
