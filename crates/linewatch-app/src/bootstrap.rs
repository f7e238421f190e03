use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use linewatch_api::{ApiDeps, ApiServer};
use linewatch_config::{AppConfig, Topology, load_topology, sample_topology};
use linewatch_core::{HealthTracker, MonitorDeps, MonitorService, ReloadOutcome, SessionLimits};
use linewatch_events::EventBus;
use linewatch_ingest::{ConsumerDeps, MessageBuffer, load_mock_dir_or_log, spawn_consumer};
use linewatch_telemetry::{LogFormat, LoggingConfig, Metrics, service_span};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the line monitor.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    topology: Topology,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the process environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Construct dependencies through an arbitrary variable lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config =
            AppConfig::from_lookup(lookup).map_err(|err| AppError::config("config.load", err))?;
        let topology = match &config.topology_file {
            Some(path) => {
                load_topology(path).map_err(|err| AppError::config("topology.load", err))?
            }
            None => Topology::new(sample_topology())
                .map_err(|err| AppError::config("topology.sample", err))?,
        };
        let events = EventBus::new();
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            topology,
            events,
            telemetry,
        })
    }
}

/// Entry point for the line monitor boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, topology loading, logging setup or the
/// HTTP listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    Box::pin(run_app_with(dependencies, shutdown_signal())).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with(
    dependencies: BootstrapDependencies,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    let BootstrapDependencies {
        config,
        topology,
        events,
        telemetry,
    } = dependencies;

    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::from_name(config.log_format.as_deref()),
        ..LoggingConfig::default()
    };
    linewatch_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    serve_monitor(config, topology, events, telemetry, shutdown)
        .instrument(service_span("linewatch"))
        .await
}

async fn serve_monitor(
    config: AppConfig,
    topology: Topology,
    events: EventBus,
    telemetry: Metrics,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    info!(
        lines = topology.lines.len(),
        topology_file = ?config.topology_file,
        "line monitor bootstrap starting"
    );

    let health = HealthTracker::new(events.clone());
    let buffer = MessageBuffer::new(config.buffer_capacity).with_metrics(telemetry.clone());
    let monitor = MonitorService::new(
        topology,
        SessionLimits {
            event_capacity: config.event_capacity,
            alert_capacity: config.alert_capacity,
        },
        config.fetch_timeout,
        MonitorDeps {
            source: Arc::new(buffer.clone()),
            events,
            metrics: telemetry.clone(),
            health: health.clone(),
        },
    );

    if let Some(dir) = &config.mock_dir {
        let loaded = load_mock_dir_or_log(dir, &buffer);
        info!(dir = %dir.display(), loaded, "mock CFX data loaded");
    }

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();
    if let Some(mqtt) = &config.mqtt {
        tasks.push(spawn_consumer(
            mqtt,
            ConsumerDeps {
                buffer: buffer.clone(),
                metrics: telemetry.clone(),
                health: health.clone(),
            },
            cancel.clone(),
        ));
    } else {
        info!("no broker configured; MQTT consumer disabled");
    }

    match config.refresh_interval {
        Some(period) => tasks.push(spawn_refresh_task(monitor.clone(), period, cancel.clone())),
        None => {
            info!("periodic refresh disabled; loading the current batch once");
            if let Err(err) = monitor.reload(false).await {
                warn!(error = %err, "initial reload failed");
            }
        }
    }

    let api = ApiServer::new(ApiDeps {
        monitor,
        buffer,
        metrics: telemetry,
        health,
    });
    let addr = SocketAddr::new(config.bind_addr, config.http_port);
    info!(addr = %addr, "Launching API listener");

    let serve_cancel = cancel.clone();
    let serve_result = api
        .serve(addr, async move {
            tokio::select! {
                () = shutdown => {}
                () = serve_cancel.cancelled() => {}
            }
        })
        .await;

    cancel.cancel();
    for task in tasks {
        if let Err(err) = task.await {
            warn!(error = %err, "background task join failed");
        }
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Reload the monitor from its batch source every `period` until `cancel` fires.
///
/// The first reload runs immediately. Failures are logged and retried on the
/// next tick; the service already records them as metrics and degraded health.
#[must_use]
pub fn spawn_refresh_task(
    monitor: MonitorService,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    info!(?period, "starting periodic refresh");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("periodic refresh cancelled");
                    break;
                }
                _ = ticker.tick() => match monitor.reload(false).await {
                    Ok(ReloadOutcome::Applied(report)) => {
                        debug!(
                            applied = report.applied,
                            duplicates = report.duplicates,
                            "refresh applied"
                        );
                    }
                    Ok(ReloadOutcome::Stale) => debug!("refresh discarded a stale batch"),
                    Err(err) => warn!(error = %err, "periodic refresh failed"),
                },
            }
        }
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::error::Error;
    use std::fs;

    use linewatch_events::MachineStatus;
    use linewatch_test_support::fixtures::two_lines;
    use linewatch_test_support::messages::{fault, state_changed};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn monitor(buffer: &MessageBuffer) -> AppResult<MonitorService> {
        let events = EventBus::with_capacity(16);
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(MonitorService::new(
            two_lines(),
            SessionLimits::default(),
            Duration::from_secs(1),
            MonitorDeps {
                source: Arc::new(buffer.clone()),
                events: events.clone(),
                metrics,
                health: HealthTracker::new(events),
            },
        ))
    }

    #[test]
    fn defaults_fall_back_to_the_sample_topology() -> AppResult<()> {
        let deps = BootstrapDependencies::from_lookup(lookup(&[]))?;
        assert_eq!(deps.topology.lines, sample_topology());
        assert!(deps.config.mqtt.is_none());
        Ok(())
    }

    #[test]
    fn topology_file_is_loaded() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lines.json");
        fs::write(
            &path,
            serde_json::to_string(&serde_json::json!([
                { "id": "line-1", "name": "Line 1", "machines": [{ "name": "SPI" }] }
            ]))?,
        )?;
        let path_value = path.display().to_string();
        let deps =
            BootstrapDependencies::from_lookup(lookup(&[("LINEWATCH_TOPOLOGY_FILE", &path_value)]))?;
        assert_eq!(deps.topology.lines.len(), 1);
        assert_eq!(deps.topology.lines[0].id, "line-1");
        Ok(())
    }

    #[test]
    fn missing_topology_file_fails_bootstrap() {
        let result = BootstrapDependencies::from_lookup(lookup(&[(
            "LINEWATCH_TOPOLOGY_FILE",
            "/nonexistent/linewatch/lines.json",
        )]));
        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "topology.load",
                ..
            })
        ));
    }

    #[test]
    fn invalid_environment_fails_bootstrap() {
        let result = BootstrapDependencies::from_lookup(lookup(&[("LINEWATCH_HTTP_PORT", "0")]));
        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "config.load",
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_task_applies_buffered_messages_until_cancelled() -> AppResult<()> {
        let buffer = MessageBuffer::new(16);
        let monitor = monitor(&buffer)?;
        let cancel = CancellationToken::new();
        let task = spawn_refresh_task(monitor.clone(), Duration::from_secs(5), cancel.clone());

        buffer.push(state_changed("u1", "SPI", "1200"));
        tokio::time::sleep(Duration::from_secs(6)).await;
        let spi = monitor
            .machine_states("line-A")
            .unwrap_or_default()
            .into_iter()
            .find(|entry| entry.name == "SPI")
            .map(|entry| entry.status);
        assert_eq!(spi, Some(MachineStatus::Running));

        buffer.push(fault("u2", "Reflow", "E201"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.alerts("line-A").map(|alerts| alerts.len()), Some(1));

        cancel.cancel();
        assert!(task.await.is_ok());
        Ok(())
    }
}
