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

//! Derived line and machine state for the monitor.
//!
//! Layout: `feed.rs` (bounded per-line rings), `stores.rs` (deduplicator,
//! history, status table, alert feed), `directory.rs` (machine routing),
//! `session.rs` + `dispatcher.rs` (owned state and batch dispatch),
//! `service.rs` (shared, generation-gated reloads), `source.rs` (batch
//! source trait), `health.rs` (degraded components), `error.rs`.

pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod health;
pub mod service;
pub mod session;
pub mod source;
pub mod stores;

pub use directory::MachineDirectory;
pub use dispatcher::{DispatchReport, LineAlert, StatusChange};
pub use error::{MonitorError, MonitorResult, SourceError};
pub use feed::LineFeed;
pub use health::{BATCH_SOURCE_COMPONENT, BROKER_COMPONENT, HealthTracker};
pub use service::{MonitorDeps, MonitorService, ReloadOutcome};
pub use session::{MonitorSession, SessionLimits};
pub use source::BatchSource;
pub use stores::{AlertFeed, Deduplicator, EventHistory, MachineEntry, MachineStatusTable};
