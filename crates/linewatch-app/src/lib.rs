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

//! Line monitor application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (service wiring and background tasks), `error.rs`
//! (application errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;

pub use bootstrap::{run_app, spawn_refresh_task};
pub use error::{AppError, AppResult};
