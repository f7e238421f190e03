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

//! Environment-driven settings and line topology for the monitor.
//!
//! Layout: `app.rs` (`AppConfig` from env), `model.rs` (topology models),
//! `topology.rs` (file loading and sample lines), `validate.rs` (parsing and
//! validation helpers), `defaults.rs` (fallback values).

pub mod app;
pub mod defaults;
pub mod error;
pub mod model;
pub mod topology;
pub mod validate;

pub use app::{AppConfig, MqttConfig};
pub use defaults::{ALERT_CAPACITY, EVENT_CAPACITY};
pub use error::{ConfigError, ConfigResult};
pub use model::{CfxEndpoint, Connection, LineConfig, MachineConfig, NameCollision};
pub use topology::{Topology, load_topology, parse_topology, sample_topology};
pub use validate::{BrokerAddress, find_collisions, parse_broker_url, validate_topology};
