//! Process configuration resolved from environment variables.
//!
//! # Design
//! - Every value is read through a lookup function so tests never touch the
//!   real process environment.
//! - Invalid values fail fast with the variable name and a machine-readable reason.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{
    BrokerAddress, parse_bind_addr, parse_broker_url, parse_capacity, parse_port, parse_secs,
};

/// MQTT consumer settings; present only when a broker URL is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    /// Broker coordinates.
    pub broker: BrokerAddress,
    /// Subscription filter (and default publish topic).
    pub topic: String,
    /// MQTT client identifier.
    pub client_id: String,
}

/// Fully resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP bind address.
    pub bind_addr: IpAddr,
    /// HTTP port.
    pub http_port: u16,
    /// Topology document; `None` selects the built-in sample lines.
    pub topology_file: Option<PathBuf>,
    /// Broker settings; `None` disables the consumer.
    pub mqtt: Option<MqttConfig>,
    /// Mock message directory loaded at startup.
    pub mock_dir: Option<PathBuf>,
    /// Bound of the in-memory message buffer.
    pub buffer_capacity: usize,
    /// Per-line event history cap.
    pub event_capacity: usize,
    /// Per-line alert feed cap.
    pub alert_capacity: usize,
    /// Periodic reload interval; `None` disables the refresh task.
    pub refresh_interval: Option<Duration>,
    /// Upper bound for one batch fetch.
    pub fetch_timeout: Duration,
    /// Tracing filter directive.
    pub log_level: String,
    /// Explicit log format (`json` or `pretty`); inferred when unset.
    pub log_format: Option<String>,
}

impl AppConfig {
    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when any variable fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when any variable fails validation.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_addr = get("LINEWATCH_BIND_ADDR")
            .map(|value| parse_bind_addr("LINEWATCH_BIND_ADDR", &value))
            .transpose()?
            .unwrap_or(defaults::BIND_ADDR);

        let http_port = match (get("LINEWATCH_HTTP_PORT"), get("PORT")) {
            (Some(value), _) => parse_port("LINEWATCH_HTTP_PORT", &value)?,
            (None, Some(value)) => parse_port("PORT", &value)?,
            (None, None) => defaults::HTTP_PORT,
        };

        let mqtt = match (get("LINEWATCH_MQTT_URL"), get("RABBITMQ_URL")) {
            (Some(value), _) => Some(parse_broker_url("LINEWATCH_MQTT_URL", &value)?),
            (None, Some(value)) => Some(parse_broker_url("RABBITMQ_URL", &value)?),
            (None, None) => None,
        }
        .map(|broker| MqttConfig {
            broker,
            topic: get("LINEWATCH_MQTT_TOPIC").unwrap_or_else(|| defaults::MQTT_TOPIC.to_string()),
            client_id: get("LINEWATCH_MQTT_CLIENT_ID")
                .unwrap_or_else(|| defaults::MQTT_CLIENT_ID.to_string()),
        });

        let capacity = |name: &str, default: usize| -> ConfigResult<usize> {
            get(name).map_or(Ok(default), |value| parse_capacity(name, &value))
        };
        let seconds = |name: &str, default: u64| -> ConfigResult<Duration> {
            get(name).map_or(Ok(Duration::from_secs(default)), |value| {
                parse_secs(name, &value)
            })
        };

        let refresh = seconds("LINEWATCH_REFRESH_SECS", defaults::REFRESH_SECS)?;
        let fetch_timeout = seconds("LINEWATCH_FETCH_TIMEOUT_SECS", defaults::FETCH_TIMEOUT_SECS)?;
        if fetch_timeout.is_zero() {
            return Err(ConfigError::invalid_field(
                "LINEWATCH_FETCH_TIMEOUT_SECS",
                Some("0"),
                "zero",
            ));
        }

        let log_format = get("LINEWATCH_LOG_FORMAT")
            .map(|value| {
                let normalized = value.trim().to_ascii_lowercase();
                if matches!(normalized.as_str(), "json" | "pretty") {
                    Ok(normalized)
                } else {
                    Err(ConfigError::invalid_field(
                        "LINEWATCH_LOG_FORMAT",
                        Some(&value),
                        "unknown_format",
                    ))
                }
            })
            .transpose()?;

        Ok(Self {
            bind_addr,
            http_port,
            topology_file: get("LINEWATCH_TOPOLOGY_FILE").map(PathBuf::from),
            mqtt,
            mock_dir: get("LINEWATCH_MOCK_DIR").map(PathBuf::from),
            buffer_capacity: capacity("LINEWATCH_BUFFER_CAPACITY", defaults::BUFFER_CAPACITY)?,
            event_capacity: capacity("LINEWATCH_EVENT_CAPACITY", defaults::EVENT_CAPACITY)?,
            alert_capacity: capacity("LINEWATCH_ALERT_CAPACITY", defaults::ALERT_CAPACITY)?,
            refresh_interval: (!refresh.is_zero()).then_some(refresh),
            fetch_timeout,
            log_level: get("LINEWATCH_LOG_LEVEL")
                .or_else(|| get("RUST_LOG"))
                .unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            log_format,
        })
    }
}
