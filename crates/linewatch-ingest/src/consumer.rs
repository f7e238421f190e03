//! MQTT consumer feeding the message buffer.
//!
//! # Design
//! - QoS 1 with manual acknowledgements; every publish is acked after it was
//!   handled, including payloads that failed to decode.
//! - The subscription is (re)issued on every `ConnAck` so reconnects resume it.
//! - Connection errors mark the broker degraded and retry after a fixed back-off.

use std::time::Duration;

use linewatch_config::MqttConfig;
use linewatch_core::{BROKER_COMPONENT, HealthTracker};
use linewatch_telemetry::{Metrics, received};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, Publish, QoS};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::MessageBuffer;
use crate::decode::decode_payload;

/// Delay before polling again after a connection error.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CAPACITY: usize = 64;

/// Collaborators the consumer writes into.
#[derive(Clone)]
pub struct ConsumerDeps {
    /// Destination of decoded messages.
    pub buffer: MessageBuffer,
    /// Metrics registry.
    pub metrics: Metrics,
    /// Degraded-component tracker.
    pub health: HealthTracker,
}

/// MQTT options for a broker configuration.
#[must_use]
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options =
        MqttOptions::new(&config.client_id, &config.broker.host, config.broker.port);
    options.set_keep_alive(KEEP_ALIVE);
    if let Some((username, password)) = &config.broker.credentials {
        options.set_credentials(username, password);
    }
    options
}

/// Spawn the consumer loop; it runs until `cancel` fires.
#[must_use]
pub fn spawn_consumer(
    config: &MqttConfig,
    deps: ConsumerDeps,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut options = mqtt_options(config);
    options.set_manual_acks(true);
    let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
    let topic = config.topic.clone();
    info!(
        host = %config.broker.host,
        port = config.broker.port,
        topic = %topic,
        "starting MQTT consumer"
    );

    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("MQTT consumer cancelled");
                    let _ = client.try_disconnect();
                    break;
                }
                event = event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        deps.health.mark_healthy(BROKER_COMPONENT);
                        if let Err(err) = client.subscribe(topic.as_str(), QoS::AtLeastOnce).await {
                            warn!(error = %err, topic = %topic, "MQTT subscribe failed");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_publish(&publish, &deps);
                        if let Err(err) = client.ack(&publish).await {
                            warn!(error = %err, "MQTT ack failed");
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "MQTT connection error");
                        deps.health.mark_degraded(BROKER_COMPONENT);
                        tokio::select! {
                            () = cancel.cancelled() => {}
                            () = tokio::time::sleep(RECONNECT_BACKOFF) => {}
                        }
                    }
                },
            }
        }
    })
}

fn handle_publish(publish: &Publish, deps: &ConsumerDeps) {
    match decode_payload(&publish.payload) {
        Ok(messages) => {
            for message in &messages {
                debug!(
                    unique_id = %message.unique_id,
                    source = %message.source,
                    kind = %message.kind(),
                    "received CFX message"
                );
                deps.metrics.inc_cfx_received(received::DECODED);
            }
            deps.buffer.extend(messages);
        }
        Err(err) => {
            warn!(topic = %publish.topic, error = %err, "discarding undecodable CFX payload");
            deps.metrics.inc_cfx_received(received::INVALID);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch_config::BrokerAddress;
    use linewatch_events::EventBus;

    fn deps() -> ConsumerDeps {
        ConsumerDeps {
            buffer: MessageBuffer::new(10),
            metrics: Metrics::new().expect("metrics registry"),
            health: HealthTracker::new(EventBus::with_capacity(8)),
        }
    }

    fn publish(payload: &str) -> Publish {
        Publish::new("cfx/line-a/spi", QoS::AtLeastOnce, payload.as_bytes().to_vec())
    }

    #[test]
    fn decoded_payloads_land_in_the_buffer() {
        let deps = deps();
        handle_publish(
            &publish(
                r#"{"MessageName":"CFX.ResourcePerformance.StationStateChanged","TimeStamp":"2024-01-15T14:23:15Z","UniqueID":"u1","Source":"SPI","MessageBody":{"NewState":"1200"}}"#,
            ),
            &deps,
        );
        assert_eq!(deps.buffer.len(), 1);
    }

    #[test]
    fn undecodable_payloads_are_counted_and_dropped() {
        let deps = deps();
        handle_publish(&publish("{broken"), &deps);
        assert!(deps.buffer.is_empty());
        let rendered = deps.metrics.render().expect("render");
        assert!(rendered.contains(r#"cfx_messages_received_total{outcome="invalid"} 1"#));
    }

    #[test]
    fn options_carry_credentials_and_client_id() {
        let config = MqttConfig {
            broker: BrokerAddress {
                host: "broker.local".into(),
                port: 1884,
                credentials: Some(("user".into(), "secret".into())),
            },
            topic: "cfx/#".into(),
            client_id: "linewatch-test".into(),
        };
        let options = mqtt_options(&config);
        assert_eq!(options.client_id(), "linewatch-test");
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1884));
        assert_eq!(
            options.credentials(),
            Some(("user".to_string(), "secret".to_string()))
        );
    }
}
