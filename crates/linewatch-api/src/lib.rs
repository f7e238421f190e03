#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]

//! HTTP surface of the line monitor.
//!
//! Layout: `http/` (router, handlers, middleware), `state.rs` (shared
//! handler state), `error.rs` (server errors).

pub mod error;
pub mod http;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::errors::{ProblemDetails, ProblemInvalidParam};
pub use http::lines::LineSummary;
pub use http::router::ApiServer;
pub use http::topology::TopologyResponse;
pub use state::ApiDeps;
