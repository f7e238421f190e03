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

//! CFX message model, status classification, and the monitor event bus.
//!
//! Layout: `cfx.rs` (wire messages and typed body view), `status.rs` (state
//! code classifier), `alert.rs` (alert records), `payloads.rs` (bus events),
//! `routing.rs` (`EventBus`).

pub mod alert;
pub mod cfx;
pub mod payloads;
pub mod routing;
pub mod status;

pub use alert::{Alert, AlertKind, display_time};
pub use cfx::{CfxBody, CfxMessage, FAULT_OCCURRED, STATION_STATE_CHANGED, StateCode};
pub use payloads::{DEFAULT_REPLAY_CAPACITY, EventEnvelope, EventId, MonitorEvent};
pub use routing::{EventBus, EventStream};
pub use status::{MachineStatus, classify, classify_code};
