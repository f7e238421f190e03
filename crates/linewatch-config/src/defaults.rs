//! Default values for environment-driven settings.

use std::net::{IpAddr, Ipv4Addr};

pub(crate) const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub(crate) const HTTP_PORT: u16 = 3001;
pub(crate) const MQTT_PORT: u16 = 1883;
pub(crate) const MQTT_TOPIC: &str = "cfx/#";
pub(crate) const MQTT_CLIENT_ID: &str = "linewatch-ingest";
pub(crate) const BUFFER_CAPACITY: usize = 10_000;
/// Per-line event history cap.
pub const EVENT_CAPACITY: usize = 100;
/// Per-line alert feed cap.
pub const ALERT_CAPACITY: usize = 10;
pub(crate) const REFRESH_SECS: u64 = 5;
pub(crate) const FETCH_TIMEOUT_SECS: u64 = 10;
pub(crate) const LOG_LEVEL: &str = "info";
